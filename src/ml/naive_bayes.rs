//! Multinomial naive Bayes over non-negative term weights.

use super::classifier::{Classifier, ClassifierError, signed_targets};
use crate::text::FeatureMatrix;

#[derive(Debug, Clone)]
pub struct MultinomialNb {
    /// Additive (Laplace) smoothing.
    pub alpha: f64,
    fitted: Option<NbModel>,
}

#[derive(Debug, Clone)]
struct NbModel {
    class_log_prior: [f64; 2],
    /// Per-class log probability of each feature, `[class][feature]`.
    feature_log_prob: [Vec<f64>; 2],
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            fitted: None,
        }
    }
}

impl MultinomialNb {
    fn joint_log_likelihood(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>, ClassifierError> {
        let model = self.fitted.as_ref().ok_or(ClassifierError::NotFitted)?;
        let expected = model.feature_log_prob[0].len();
        if features.cols() != expected {
            return Err(ClassifierError::FeatureMismatch {
                expected,
                found: features.cols(),
            });
        }
        Ok(features
            .outer_iterator()
            .map(|row| {
                let mut joint = model.class_log_prior;
                for (&col, &value) in row.indices().iter().zip(row.data()) {
                    joint[0] += value * model.feature_log_prob[0][col];
                    joint[1] += value * model.feature_log_prob[1][col];
                }
                joint
            })
            .collect())
    }
}

impl Classifier for MultinomialNb {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[i64]) -> Result<(), ClassifierError> {
        let targets = signed_targets(features, labels)?;
        let n_features = features.cols();
        let mut feature_count = [vec![0.0f64; n_features], vec![0.0f64; n_features]];
        let mut class_count = [0.0f64; 2];
        for (row, &target) in features.outer_iterator().zip(&targets) {
            let class = usize::from(target > 0.0);
            class_count[class] += 1.0;
            for (&col, &value) in row.indices().iter().zip(row.data()) {
                if value < 0.0 {
                    return Err(ClassifierError::NegativeFeature);
                }
                feature_count[class][col] += value;
            }
        }

        let alpha = self.alpha.max(1e-10);
        let total = class_count[0] + class_count[1];
        let feature_log_prob = feature_count.map(|counts| {
            let denominator = (counts.iter().sum::<f64>() + alpha * n_features as f64).ln();
            counts
                .into_iter()
                .map(|count| (count + alpha).ln() - denominator)
                .collect::<Vec<f64>>()
        });
        self.fitted = Some(NbModel {
            class_log_prior: class_count.map(|count| (count / total).ln()),
            feature_log_prob,
        });
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        Ok(self
            .joint_log_likelihood(features)?
            .into_iter()
            .map(|joint| i64::from(joint[1] > joint[0]))
            .collect())
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>, ClassifierError> {
        Ok(self
            .joint_log_likelihood(features)?
            .into_iter()
            .map(|joint| {
                let max = joint[0].max(joint[1]);
                let e0 = (joint[0] - max).exp();
                let e1 = (joint[1] - max).exp();
                let sum = e0 + e1;
                [e0 / sum, e1 / sum]
            })
            .collect())
    }
}

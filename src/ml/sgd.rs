//! Linear SVM fitted with plain stochastic gradient descent on the hinge loss.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::classifier::{Classifier, ClassifierError, LinearModel, signed_targets, sparse_dot};
use crate::text::FeatureMatrix;

/// Intercept updates are damped on sparse inputs.
const SPARSE_INTERCEPT_DECAY: f64 = 0.01;
const MIN_WEIGHT_SCALE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct SgdOptions {
    /// L2 regularization strength.
    pub alpha: f64,
    /// Passes over the training data.
    pub epochs: usize,
    pub seed: u64,
}

impl Default for SgdOptions {
    fn default() -> Self {
        Self {
            alpha: 1e-3,
            epochs: 5,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SgdClassifier {
    options: SgdOptions,
    model: Option<LinearModel>,
}

impl SgdClassifier {
    pub fn new(options: SgdOptions) -> Self {
        Self {
            options,
            model: None,
        }
    }

    fn model(&self) -> Result<&LinearModel, ClassifierError> {
        self.model.as_ref().ok_or(ClassifierError::NotFitted)
    }
}

impl Classifier for SgdClassifier {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[i64]) -> Result<(), ClassifierError> {
        let targets = signed_targets(features, labels)?;
        let alpha = self.options.alpha.max(f64::EPSILON);
        let mut weights = vec![0.0f64; features.cols()];
        let mut weight_scale = 1.0f64;
        let mut bias = 0.0f64;

        // "Optimal" learning-rate schedule: eta_t = 1 / (alpha * (t0 + t)).
        let typical_weight = (1.0 / alpha.sqrt()).sqrt();
        let t0 = 1.0 / (typical_weight * alpha);

        let rows: Vec<_> = features.outer_iterator().collect();
        let mut order: Vec<usize> = (0..rows.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut step = 0.0f64;
        for _epoch in 0..self.options.epochs.max(1) {
            order.shuffle(&mut rng);
            for &idx in &order {
                let row = &rows[idx];
                let y = targets[idx];
                let eta = 1.0 / (alpha * (t0 + step));
                let margin = y * (sparse_dot(row.indices(), row.data(), &weights) * weight_scale + bias);
                weight_scale *= (1.0 - eta * alpha).max(0.0);
                if weight_scale < MIN_WEIGHT_SCALE {
                    for w in &mut weights {
                        *w *= weight_scale;
                    }
                    weight_scale = 1.0;
                }
                if margin < 1.0 {
                    let update = eta * y;
                    for (&col, &value) in row.indices().iter().zip(row.data()) {
                        weights[col] += update * value / weight_scale;
                    }
                    bias += update * SPARSE_INTERCEPT_DECAY;
                }
                step += 1.0;
            }
        }
        for w in &mut weights {
            *w *= weight_scale;
        }
        self.model = Some(LinearModel { weights, bias });
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        self.model()?.predict(features)
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>, ClassifierError> {
        self.model()?.predict_proba(features)
    }
}

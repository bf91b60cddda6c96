//! L2-regularized squared-hinge linear SVM solved by dual coordinate descent.
//!
//! The intercept is learned as the weight of a constant feature equal to `1`, so it is
//! regularized together with the other weights.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::classifier::{Classifier, ClassifierError, LinearModel, signed_targets, sparse_dot};
use crate::text::FeatureMatrix;

#[derive(Debug, Clone)]
pub struct LinearSvcOptions {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the projected-gradient spread drops below this value.
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for LinearSvcOptions {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinearSvc {
    pub options: LinearSvcOptions,
    model: Option<LinearModel>,
}

impl LinearSvc {
    pub fn new(options: LinearSvcOptions) -> Self {
        Self {
            options,
            model: None,
        }
    }

    fn model(&self) -> Result<&LinearModel, ClassifierError> {
        self.model.as_ref().ok_or(ClassifierError::NotFitted)
    }
}

impl Classifier for LinearSvc {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[i64]) -> Result<(), ClassifierError> {
        let targets = signed_targets(features, labels)?;
        let rows: Vec<_> = features.outer_iterator().collect();
        let diag = 0.5 / self.options.c.max(f64::EPSILON);
        let q_diag: Vec<f64> = rows
            .iter()
            .map(|row| row.data().iter().map(|v| v * v).sum::<f64>() + 1.0 + diag)
            .collect();

        let mut alpha = vec![0.0f64; rows.len()];
        let mut weights = vec![0.0f64; features.cols()];
        let mut bias = 0.0f64;
        let mut order: Vec<usize> = (0..rows.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.options.seed);

        let mut iterations = 0usize;
        while iterations < self.options.max_iter {
            order.shuffle(&mut rng);
            let mut max_pg = f64::NEG_INFINITY;
            let mut min_pg = f64::INFINITY;
            for &i in &order {
                let row = &rows[i];
                let y = targets[i];
                let gradient =
                    y * (sparse_dot(row.indices(), row.data(), &weights) + bias) - 1.0 + diag * alpha[i];
                let projected = if alpha[i] == 0.0 {
                    gradient.min(0.0)
                } else {
                    gradient
                };
                max_pg = max_pg.max(projected);
                min_pg = min_pg.min(projected);
                if projected.abs() > 1e-12 {
                    let previous = alpha[i];
                    alpha[i] = (alpha[i] - gradient / q_diag[i]).max(0.0);
                    let delta = (alpha[i] - previous) * y;
                    for (&col, &value) in row.indices().iter().zip(row.data()) {
                        weights[col] += delta * value;
                    }
                    bias += delta;
                }
            }
            iterations += 1;
            if max_pg - min_pg <= self.options.tolerance {
                break;
            }
        }
        if iterations >= self.options.max_iter {
            tracing::warn!(iterations, "LinearSvc did not converge");
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

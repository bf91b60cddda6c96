use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};

use crate::ml::classifier::{ClassifierError, LinearModel, sigmoid, signed_targets, sparse_dot};
use crate::text::FeatureMatrix;

/// Training options for the logistic regression classifier.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    pub batch_size: usize,
    pub seed: u64,
    pub balance_classes: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 1.0,
            l2: 1e-4,
            batch_size: 32,
            seed: 42,
            balance_classes: false,
        }
    }
}

/// Mini-batch gradient descent on the L2-regularized log loss.
pub(crate) fn train_logreg(
    features: &FeatureMatrix,
    labels: &[i64],
    options: &TrainOptions,
) -> Result<LinearModel, ClassifierError> {
    let targets = signed_targets(features, labels)?;
    let dim = features.cols();
    let rows: Vec<_> = features.outer_iterator().collect();

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut weights = vec![0.0f64; dim];
    let mut bias = 0.0f64;
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    let batch_size = options.batch_size.max(1);
    let lr = options.learning_rate;
    let l2 = options.l2.max(0.0);

    let class_weights = if options.balance_classes {
        let positives = targets.iter().filter(|&&y| y > 0.0).count() as f64;
        let negatives = targets.len() as f64 - positives;
        let total = targets.len() as f64;
        [total / (2.0 * negatives), total / (2.0 * positives)]
    } else {
        [1.0, 1.0]
    };

    let mut grad_w = vec![0.0f64; dim];
    for _epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        for chunk in indices.chunks(batch_size) {
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0f64;
            let mut batch_weight = 0.0f64;
            for &idx in chunk {
                let row = &rows[idx];
                let positive = targets[idx] > 0.0;
                let weight = class_weights[usize::from(positive)];
                let prob = sigmoid(sparse_dot(row.indices(), row.data(), &weights) + bias);
                let diff = (prob - if positive { 1.0 } else { 0.0 }) * weight;
                for (&col, &value) in row.indices().iter().zip(row.data()) {
                    grad_w[col] += diff * value;
                }
                grad_b += diff;
                batch_weight += weight;
            }
            if batch_weight == 0.0 {
                continue;
            }
            let inv = 1.0 / batch_weight;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= lr * (g * inv + l2 * *w);
            }
            bias -= lr * grad_b * inv;
        }
    }

    Ok(LinearModel { weights, bias })
}

//! Uncertainty scoring for active-learning sample selection.

use crate::dataset::DocumentTable;
use crate::error::LearnerError;
use crate::ml::{Classifier, TextPipeline};
use crate::text::TfidfParams;

/// `1 - 2 * |p - 0.5|`: one on the decision boundary, zero for a certain prediction.
pub fn uncertainty(positive_probability: f64) -> f64 {
    if !positive_probability.is_finite() {
        return 0.0;
    }
    let p = positive_probability.clamp(0.0, 1.0);
    (1.0 - 2.0 * (p - 0.5).abs()).clamp(0.0, 1.0)
}

/// Fit `classifier` on `train_set` and write an uncertainty score into every row of `full`.
///
/// The table is returned rather than saved.
pub fn score(
    classifier: Box<dyn Classifier>,
    mut full: DocumentTable,
    train_set: &DocumentTable,
    params: &TfidfParams,
) -> Result<DocumentTable, LearnerError> {
    if train_set.is_empty() {
        return Err(LearnerError::insufficient("scorer training set is empty"));
    }
    let pipeline = TextPipeline::fit(&train_set.texts(), &train_set.labels(), params, classifier)?;
    let probabilities = pipeline.predict_proba(&full.texts())?;
    let mut total = 0.0;
    for (row, proba) in full.iter_mut().zip(&probabilities) {
        row.score = uncertainty(proba[1]);
        total += row.score;
    }
    tracing::debug!(
        rows = probabilities.len(),
        mean_score = total / probabilities.len().max(1) as f64,
        "Scored documents"
    );
    Ok(full)
}

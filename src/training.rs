//! Classifier training against the fixed held-out split.

use serde::Serialize;

use crate::dataset::DocumentTable;
use crate::error::LearnerError;
use crate::history::HistoryLog;
use crate::ml::{ClassifierKind, TextPipeline, metrics};
use crate::text::TfidfParams;

/// Result of one training round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Every F1 recorded so far, this round's value last.
    pub f1_history: Vec<f64>,
}

/// Fit `kind` on the labeled rows of `train_set`, evaluate on `eval_set`, record the F1.
///
/// The history is only appended once evaluation has succeeded.
pub fn train<H: HistoryLog + ?Sized>(
    train_set: &DocumentTable,
    eval_set: &DocumentTable,
    kind: ClassifierKind,
    params: &TfidfParams,
    history: &H,
) -> Result<TrainReport, LearnerError> {
    if train_set.is_empty() {
        return Err(LearnerError::insufficient("no labeled documents to train on"));
    }
    if eval_set.is_empty() {
        return Err(LearnerError::insufficient("held-out split is empty"));
    }
    let pipeline = TextPipeline::fit(
        &train_set.texts(),
        &train_set.labels(),
        params,
        kind.build(),
    )?;
    let predicted = pipeline.predict(&eval_set.texts())?;
    let scores = metrics::binary_scores(&eval_set.labels(), &predicted);
    history.append(scores.f1)?;
    let f1_history = history.read_all()?;
    tracing::info!(
        classifier = %kind,
        train_rows = train_set.len(),
        eval_rows = eval_set.len(),
        precision = scores.precision,
        recall = scores.recall,
        f1 = scores.f1,
        rounds = f1_history.len(),
        "Trained classifier"
    );
    Ok(TrainReport {
        precision: scores.precision,
        recall: scores.recall,
        f1: scores.f1,
        f1_history,
    })
}

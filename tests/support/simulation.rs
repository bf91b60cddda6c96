//! Offline labeling simulations that answer with peer-derived labels.

use std::collections::HashSet;

use glyphlearn::dataset::import::label_from_peer;
use glyphlearn::dataset::{DocumentId, TableStore};
use glyphlearn::embedding::SeedStore;
use glyphlearn::history::HistoryLog;
use glyphlearn::{ActiveLearner, AnswerResponse, LabelSubmission};
use serde_json::json;

pub fn submission(id: DocumentId, label: i64) -> LabelSubmission {
    LabelSubmission {
        document_id: id,
        question_id: Some(json!(1)),
        answer: json!(label),
        text: None,
    }
}

/// Label `ids` with the class their peer label implies, one submission each.
pub fn mock_training<D, E, H, S>(
    learner: &ActiveLearner<D, E, H, S>,
    ids: &[DocumentId],
) -> Vec<AnswerResponse>
where
    D: TableStore,
    E: TableStore,
    H: HistoryLog,
    S: SeedStore,
{
    let threshold = learner.settings().import.positive_threshold;
    let table = learner.dataset().load().unwrap();
    ids.iter()
        .map(|&id| {
            let peer = table.get(id).unwrap().peer_label;
            learner
                .handle_answer(&submission(id, label_from_peer(peer, threshold)))
                .unwrap()
        })
        .collect()
}

/// Uncertainty sampling: each round labels the `batch` highest-scored unlabeled documents
/// outside `held_out`, then runs a full update so the scores refresh.
///
/// Returns the latest F1 after every round that trained.
pub fn simulate_training<D, E, H, S>(
    learner: &ActiveLearner<D, E, H, S>,
    held_out: &HashSet<DocumentId>,
    rounds: usize,
    batch: usize,
) -> Vec<f64>
where
    D: TableStore,
    E: TableStore,
    H: HistoryLog,
    S: SeedStore,
{
    let mut scores = Vec::new();
    for _ in 0..rounds {
        let table = learner.dataset().load().unwrap();
        let mut candidates: Vec<(DocumentId, f64)> = table
            .rows()
            .iter()
            .filter(|row| !row.is_labeled && !held_out.contains(&row.id))
            .map(|row| (row.id, row.score))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let picked: Vec<DocumentId> = candidates.iter().take(batch).map(|c| c.0).collect();
        if picked.is_empty() {
            break;
        }
        let responses = mock_training(learner, &picked);
        if let Some(report) = responses.iter().rev().find_map(|r| r.train_result.as_ref()) {
            scores.push(report.f1);
        }
        learner.handle_complete_update().unwrap();
    }
    scores
}

/// Label `ids` in order and record the F1 history after each step of `step` labels.
pub fn stepwise_metrics<D, E, H, S>(
    learner: &ActiveLearner<D, E, H, S>,
    ids: &[DocumentId],
    step: usize,
) -> Vec<Vec<f64>>
where
    D: TableStore,
    E: TableStore,
    H: HistoryLog,
    S: SeedStore,
{
    ids.chunks(step.max(1))
        .map(|chunk| {
            mock_training(learner, chunk);
            learner.history().unwrap()
        })
        .collect()
}

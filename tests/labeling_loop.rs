mod support;

use std::collections::HashSet;

use glyphlearn::config::Settings;
use glyphlearn::dataset::{CsvTableStore, TableStore, UNLABELED};
use glyphlearn::{FileLearner, LearnerError};
use serde_json::json;
use support::{corpus, simulation};
use tempfile::TempDir;

struct Harness {
    temp: TempDir,
    learner: FileLearner,
    settings: Settings,
}

impl Harness {
    fn imported(count: usize) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.data_dir = Some(temp.path().to_path_buf());
        if count <= settings.import.eval_split_start {
            settings.import.eval_split_start = count * 4 / 5;
        }
        let paths = settings.paths.resolve(temp.path());
        corpus::write_documents(&paths.source_json, &corpus::documents(count, 11));
        let learner = FileLearner::open(settings.clone(), &paths);
        learner.import_from_source().unwrap();
        Self {
            temp,
            learner,
            settings,
        }
    }

    fn table_store(&self) -> CsvTableStore {
        let paths = self.settings.paths.resolve(self.temp.path());
        CsvTableStore::new(paths.dataset)
    }

    fn eval_ids(&self) -> HashSet<i64> {
        let paths = self.settings.paths.resolve(self.temp.path());
        CsvTableStore::new(paths.eval_split)
            .load()
            .unwrap()
            .ids()
            .into_iter()
            .collect()
    }
}

#[test]
fn import_of_850_documents_freezes_the_tail_as_held_out_split() {
    let harness = Harness::imported(850);
    let table = harness.table_store().load().unwrap();
    assert_eq!(table.len(), 850);
    assert_eq!(table.labeled_count(), 0);
    assert!(table.rows().iter().all(|row| (0.0..=1.0).contains(&row.score)));

    let eval_ids = harness.eval_ids();
    assert_eq!(eval_ids.len(), 49);
    assert!(eval_ids.contains(&802));
    assert!(!eval_ids.contains(&801));
}

#[test]
fn training_starts_once_more_than_three_documents_are_labeled() {
    let harness = Harness::imported(850);
    let learner = &harness.learner;
    let mut responses = Vec::new();
    for (id, label) in [(1, 1), (2, 0), (3, 1), (4, 1), (5, 0)] {
        responses.push(learner.handle_answer(&simulation::submission(id, label)).unwrap());
    }
    assert!(responses[..3].iter().all(|r| r.train_result.is_none()));
    let fourth = responses[3].train_result.as_ref().unwrap();
    assert_eq!(fourth.f1_history.len(), 1);

    let sixth = learner
        .handle_answer(&simulation::submission(6, 1))
        .unwrap()
        .train_result
        .unwrap();
    for value in [sixth.precision, sixth.recall, sixth.f1] {
        assert!((0.0..=1.0).contains(&value));
    }
    assert_eq!(sixth.f1_history.len(), 3);
    assert_eq!(learner.history().unwrap(), sixth.f1_history);
    assert_eq!(learner.current_score().unwrap(), sixth.f1);
}

#[test]
fn every_training_round_grows_history_by_one() {
    let harness = Harness::imported(120);
    let ids: Vec<i64> = (1..=16).collect();
    let snapshots = simulation::stepwise_metrics(&harness.learner, &ids, 4);
    let lengths: Vec<usize> = snapshots.iter().map(Vec::len).collect();
    // The first batch of four trains once, every later label trains again.
    assert_eq!(lengths, vec![1, 5, 9, 13]);
    for pair in snapshots.windows(2) {
        assert_eq!(pair[1][..pair[0].len()], pair[0][..]);
    }
}

#[test]
fn reset_clears_a_hundred_labels() {
    let harness = Harness::imported(150);
    let ids: Vec<i64> = (1..=100).collect();
    simulation::mock_training(&harness.learner, &ids);
    assert_eq!(harness.table_store().load().unwrap().labeled_count(), 100);

    let table = harness.learner.reset_train_data().unwrap();
    assert_eq!(table.labeled_count(), 0);
    assert!(table.rows().iter().all(|row| row.label == UNLABELED && !row.is_labeled));
    assert_eq!(harness.table_store().load().unwrap(), table);
}

#[test]
fn label_flag_invariant_holds_on_disk_through_the_loop() {
    let harness = Harness::imported(60);
    simulation::mock_training(&harness.learner, &[3, 4, 5, 6, 7]);
    harness.learner.handle_answer(&simulation::submission(3, 0)).unwrap();
    let table = harness.table_store().load().unwrap();
    assert!(table.rows().iter().all(|row| row.is_labeled == (row.label != UNLABELED)));
    assert_eq!(table.get(3).unwrap().label, 0);
}

#[test]
fn unknown_document_leaves_files_untouched() {
    let harness = Harness::imported(40);
    let path = harness.table_store().path().to_path_buf();
    let before = std::fs::read(&path).unwrap();
    let err = harness
        .learner
        .handle_answer(&simulation::submission(4040, 1))
        .unwrap_err();
    assert!(matches!(err, LearnerError::NotFound { id: 4040 }));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn non_binary_answer_is_rejected_without_touching_the_table() {
    let harness = Harness::imported(60);
    let path = harness.table_store().path().to_path_buf();
    let before = std::fs::read(&path).unwrap();
    let err = harness
        .learner
        .handle_answer(&simulation::submission(1, 2))
        .unwrap_err();
    assert!(matches!(err, LearnerError::InvalidLabel { label: 2 }));
    assert_eq!(std::fs::read(&path).unwrap(), before);

    let responses = simulation::mock_training(&harness.learner, &[1, 2, 3, 4, 5]);
    assert!(responses.iter().any(|r| r.train_result.is_some()));
    assert_eq!(harness.table_store().load().unwrap().labeled_count(), 5);
}

#[test]
fn current_score_before_training_is_empty_history() {
    let harness = Harness::imported(30);
    assert!(matches!(
        harness.learner.current_score(),
        Err(LearnerError::EmptyHistory)
    ));
    assert!(harness.learner.history().unwrap().is_empty());
}

#[test]
fn string_answers_are_accepted() {
    let harness = Harness::imported(30);
    let submission = serde_json::from_value(json!({
        "documentId": 2,
        "questionId": 9,
        "answer": "0",
        "text": "ignored"
    }))
    .unwrap();
    harness.learner.handle_answer(&submission).unwrap();
    let row = harness.table_store().load().unwrap().get(2).cloned().unwrap();
    assert!(row.is_labeled);
    assert_eq!(row.label, 0);
}

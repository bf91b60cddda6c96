//! The active-learning loop: label submission, retraining, full updates and resets.
//!
//! [`ActiveLearner`] owns the persistence ports and the settings. Every operation loads what
//! it needs, computes its full result in memory and only then writes, so a failed step leaves
//! the stored files as they were.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ResolvedPaths, Settings};
use crate::dataset::{
    CsvTableStore, DocumentId, DocumentTable, StoreError, TableStore, feature_json, import,
};
use crate::embedding::{self, CsvSeedStore, SeedStore};
use crate::error::LearnerError;
use crate::history::{CsvHistoryLog, HistoryLog};
use crate::labeling::apply_label;
use crate::scoring;
use crate::text::TfidfVectorizer;
use crate::training::{self, TrainReport};

/// Layout algorithm name reported to the front end.
pub const LAYOUT_ALGORITHM: &str = "umap";

/// Label submitted by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSubmission {
    pub document_id: DocumentId,
    #[serde(default)]
    pub question_id: Option<Value>,
    /// Class label as a JSON number or a numeric string.
    pub answer: Value,
    #[serde(default)]
    pub text: Option<String>,
}

impl LabelSubmission {
    /// The submitted class label.
    pub fn label(&self) -> Result<i64, LearnerError> {
        let malformed = || LearnerError::MalformedAnswer {
            answer: self.answer.to_string(),
        };
        match &self.answer {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| {
                    number
                        .as_f64()
                        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
                        .map(|v| v as i64)
                })
                .ok_or_else(malformed),
            Value::String(text) => text.trim().parse().map_err(|_| malformed()),
            _ => Err(malformed()),
        }
    }
}

/// Reply to a label submission; empty when no training ran.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnswerResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_result: Option<TrainReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub id: DocumentId,
    pub x: f64,
    pub y: f64,
}

/// Reply to a full update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateResponse {
    pub algorithm: String,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub documents: usize,
    pub eval_split: usize,
}

/// Locations of the document-feature JSON read on import and written on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureJsonPaths {
    pub source: PathBuf,
    pub export: PathBuf,
}

/// The labeling loop over injected stores.
pub struct ActiveLearner<D, E, H, S> {
    dataset: D,
    eval_split: E,
    history: H,
    seeds: S,
    settings: Settings,
    feature_json: Option<FeatureJsonPaths>,
}

/// Learner backed by the files in the data directory.
pub type FileLearner = ActiveLearner<CsvTableStore, CsvTableStore, CsvHistoryLog, CsvSeedStore>;

impl FileLearner {
    pub fn open(settings: Settings, paths: &ResolvedPaths) -> Self {
        ActiveLearner::new(
            CsvTableStore::new(&paths.dataset),
            CsvTableStore::new(&paths.eval_split),
            CsvHistoryLog::new(&paths.metrics),
            CsvSeedStore::new(&paths.embedding_seed),
            settings,
        )
        .with_feature_json(FeatureJsonPaths {
            source: paths.source_json.clone(),
            export: paths.export_json.clone(),
        })
    }
}

impl<D, E, H, S> ActiveLearner<D, E, H, S>
where
    D: TableStore,
    E: TableStore,
    H: HistoryLog,
    S: SeedStore,
{
    pub fn new(dataset: D, eval_split: E, history: H, seeds: S, settings: Settings) -> Self {
        Self {
            dataset,
            eval_split,
            history,
            seeds,
            settings,
            feature_json: None,
        }
    }

    pub fn with_feature_json(mut self, paths: FeatureJsonPaths) -> Self {
        self.feature_json = Some(paths);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn history_log(&self) -> &H {
        &self.history
    }

    /// Create the document table and held-out split from source documents.
    ///
    /// Initial scores come from the scoring classifier fitted on the split. Any existing table
    /// and split are replaced.
    pub fn import_documents(&self, documents: &[Value]) -> Result<ImportSummary, LearnerError> {
        let imported = import::build_dataset(documents, &self.settings.import)
            .map_err(|message| LearnerError::FeatureJson { message })?;
        let mut table = self.rescored(imported.table, &imported.eval_split)?;
        table.reset_labels();
        self.eval_split.save(&imported.eval_split)?;
        self.dataset.save(&table)?;
        let summary = ImportSummary {
            documents: table.len(),
            eval_split: imported.eval_split.len(),
        };
        tracing::info!(
            documents = summary.documents,
            eval_split = summary.eval_split,
            "Imported documents"
        );
        Ok(summary)
    }

    /// Import from the configured source JSON.
    pub fn import_from_source(&self) -> Result<ImportSummary, LearnerError> {
        let paths = self.feature_json_paths()?;
        let documents = feature_json::load_documents(&paths.source)?;
        self.import_documents(&documents)
    }

    /// Apply a submitted label and retrain once enough documents are labeled.
    ///
    /// Training that cannot run for lack of usable data yields an empty response.
    pub fn handle_answer(&self, submission: &LabelSubmission) -> Result<AnswerResponse, LearnerError> {
        let label = submission.label()?;
        let table = apply_label(&self.dataset, submission.document_id, label)?;
        let labeled = table.labeled_count();
        if labeled <= self.settings.training.min_labeled {
            tracing::debug!(
                labeled,
                min_labeled = self.settings.training.min_labeled,
                "Not enough labels to train yet"
            );
            return Ok(AnswerResponse::default());
        }
        match self.train_on(&table) {
            Ok(report) => Ok(AnswerResponse {
                train_result: Some(report),
            }),
            Err(LearnerError::InsufficientData { reason }) => {
                tracing::warn!(labeled, "Skipping training: {reason}");
                Ok(AnswerResponse::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Train on every labeled document outside the held-out split.
    pub fn train_on(&self, table: &DocumentTable) -> Result<TrainReport, LearnerError> {
        let eval = self.eval_split.load()?;
        let held_out: HashSet<DocumentId> = eval.ids().into_iter().collect();
        let ignored = labeled_held_out(table, &held_out);
        if !ignored.is_empty() {
            tracing::debug!(?ignored, "Ignoring labels on held-out documents");
        }
        let train_set = table.labeled_subset(&held_out);
        training::train(
            &train_set,
            &eval,
            self.settings.training.classifier,
            &self.settings.vectorizer,
            &self.history,
        )
    }

    /// Rescore every document, recompute the layout and re-export the feature JSON.
    pub fn handle_complete_update(&self) -> Result<UpdateResponse, LearnerError> {
        let table = self.dataset.load()?;
        let eval = self.eval_split.load()?;
        let table = self.rescored(table, &eval)?;

        let params = &self.settings.embedding;
        let (_, features) = TfidfVectorizer::fit_transform(&table.texts(), &self.settings.vectorizer)?;
        let seed = if params.use_previous_positions {
            self.seeds.load()?
        } else {
            None
        };
        let labels = table.labels();
        let layout = embedding::embed(
            &features,
            Some(labels.as_slice()),
            seed.as_ref().map(|s| s.view()),
            params,
        )?;
        let exported = self.exported_documents(&table)?;

        self.dataset.save(&table)?;
        self.seeds.save(layout.view())?;
        if let Some((path, documents)) = exported {
            feature_json::save_documents(&path, &documents)?;
        }

        let scaled = embedding::scale_positions(&layout, params.scale);
        let positions = table
            .ids()
            .into_iter()
            .zip(scaled.rows())
            .map(|(id, row)| Position {
                id,
                x: row[0],
                y: row[1],
            })
            .collect::<Vec<_>>();
        tracing::info!(
            documents = positions.len(),
            seeded = seed.is_some(),
            "Completed full update"
        );
        Ok(UpdateResponse {
            algorithm: LAYOUT_ALGORITHM.to_string(),
            positions,
        })
    }

    /// Clear every label in the document table.
    pub fn reset_train_data(&self) -> Result<DocumentTable, LearnerError> {
        let table = self.dataset.reset()?;
        tracing::info!(documents = table.len(), "Reset labels");
        Ok(table)
    }

    /// The most recent F1.
    pub fn current_score(&self) -> Result<f64, LearnerError> {
        self.history.latest()
    }

    pub fn history(&self) -> Result<Vec<f64>, LearnerError> {
        Ok(self.history.read_all()?)
    }

    /// Write the current table into the feature JSON without recomputing anything.
    pub fn export_feature_json(&self) -> Result<usize, LearnerError> {
        let table = self.dataset.load()?;
        let Some((path, documents)) = self.exported_documents(&table)? else {
            return Err(LearnerError::FeatureJson {
                message: "no document-feature JSON configured".to_string(),
            });
        };
        feature_json::save_documents(&path, &documents)?;
        Ok(documents.len())
    }

    /// Scores from the scoring classifier fitted on `eval`; unchanged if it cannot be fitted.
    fn rescored(&self, table: DocumentTable, eval: &DocumentTable) -> Result<DocumentTable, LearnerError> {
        let kind = self.settings.scoring.classifier;
        match scoring::score(kind.build(), table.clone(), eval, &self.settings.vectorizer) {
            Ok(scored) => Ok(scored),
            Err(LearnerError::InsufficientData { reason }) => {
                tracing::warn!(classifier = %kind, "Keeping previous scores: {reason}");
                Ok(table)
            }
            Err(err) => Err(err),
        }
    }

    fn feature_json_paths(&self) -> Result<&FeatureJsonPaths, LearnerError> {
        self.feature_json
            .as_ref()
            .ok_or_else(|| LearnerError::FeatureJson {
                message: "no document-feature JSON configured".to_string(),
            })
    }

    /// Documents with the table's derived values written in, plus where to save them.
    ///
    /// Reads the previous export when present so front-end edits to it are kept.
    fn exported_documents(
        &self,
        table: &DocumentTable,
    ) -> Result<Option<(PathBuf, Vec<Value>)>, LearnerError> {
        let Some(paths) = &self.feature_json else {
            return Ok(None);
        };
        let input = if paths.export.is_file() {
            &paths.export
        } else if paths.source.is_file() {
            &paths.source
        } else {
            tracing::debug!("No document-feature JSON to export into");
            return Ok(None);
        };
        let mut documents = feature_json::load_documents(input)?;
        let updated = feature_json::write_back(&mut documents, table, &self.settings.export)
            .map_err(|message| StoreError::Malformed {
                path: input.clone(),
                message,
            })?;
        tracing::debug!(updated, total = documents.len(), "Prepared feature JSON export");
        Ok(Some((paths.export.clone(), documents)))
    }
}

/// Ids of labeled rows that belong to the held-out split and are kept out of training.
fn labeled_held_out(table: &DocumentTable, held_out: &HashSet<DocumentId>) -> Vec<DocumentId> {
    table
        .rows()
        .iter()
        .filter(|row| row.is_labeled && held_out.contains(&row.id))
        .map(|row| row.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DocumentRecord, MemoryTableStore, UNLABELED};
    use crate::embedding::MemorySeedStore;
    use crate::history::MemoryHistoryLog;
    use serde_json::json;

    type MemoryLearner =
        ActiveLearner<MemoryTableStore, MemoryTableStore, MemoryHistoryLog, MemorySeedStore>;

    const MUSIC: [&str; 4] = ["konzert", "band", "musik", "chor"];
    const SPORT: [&str; 4] = ["fussball", "tor", "liga", "spiel"];

    fn text(idx: usize) -> String {
        let words = if idx % 2 == 0 { MUSIC } else { SPORT };
        format!("{} {} {}", words[idx % 4], words[(idx + 1) % 4], words[(idx / 2) % 4])
    }

    fn learner(rows: usize, eval_from: usize) -> MemoryLearner {
        let table: DocumentTable = (0..rows)
            .map(|idx| {
                let peer = if idx % 2 == 0 { 0.9 } else { 0.1 };
                DocumentRecord::unlabeled(idx as i64 + 1, text(idx), peer)
            })
            .collect();
        let eval: DocumentTable = table
            .rows()
            .iter()
            .skip(eval_from)
            .cloned()
            .map(|mut row| {
                row.set_label(i64::from(row.peer_label > 0.5));
                row
            })
            .collect();
        ActiveLearner::new(
            MemoryTableStore::new(table),
            MemoryTableStore::new(eval),
            MemoryHistoryLog::default(),
            MemorySeedStore::default(),
            settings(),
        )
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.vectorizer.max_df = 1.0;
        settings.embedding.epochs = 20;
        settings.embedding.n_neighbors = 4;
        settings
    }

    fn submit(id: DocumentId, answer: Value) -> LabelSubmission {
        LabelSubmission {
            document_id: id,
            question_id: None,
            answer,
            text: None,
        }
    }

    #[test]
    fn parses_numeric_and_string_answers() {
        assert_eq!(submit(1, json!(1)).label().unwrap(), 1);
        assert_eq!(submit(1, json!("0")).label().unwrap(), 0);
        assert_eq!(submit(1, json!(1.0)).label().unwrap(), 1);
        assert!(matches!(
            submit(1, json!("yes")).label(),
            Err(LearnerError::MalformedAnswer { .. })
        ));
        let parsed: LabelSubmission =
            serde_json::from_value(json!({"documentId": 4, "questionId": "q", "answer": "1", "text": "t"}))
                .unwrap();
        assert_eq!(parsed.document_id, 4);
        assert_eq!(parsed.label().unwrap(), 1);
    }

    #[test]
    fn trains_only_after_threshold() {
        let learner = learner(30, 20);
        for (id, label) in [(1, 1), (2, 0), (3, 1)] {
            let response = learner.handle_answer(&submit(id, json!(label))).unwrap();
            assert!(response.train_result.is_none());
        }
        let response = learner.handle_answer(&submit(4, json!(0))).unwrap();
        let report = response.train_result.unwrap();
        assert_eq!(report.f1_history.len(), 1);
        assert!((0.0..=1.0).contains(&report.f1));
        assert_eq!(learner.current_score().unwrap(), report.f1);
    }

    #[test]
    fn single_class_labels_give_empty_response() {
        let learner = learner(30, 20);
        for id in 1..=5 {
            let response = learner.handle_answer(&submit(id, json!(1))).unwrap();
            assert_eq!(serde_json::to_value(&response).unwrap(), json!({}));
        }
        assert!(matches!(learner.current_score(), Err(LearnerError::EmptyHistory)));
    }

    #[test]
    fn out_of_range_answer_is_rejected_and_loop_keeps_training() {
        let learner = learner(30, 20);
        let before = learner.dataset().load().unwrap();
        let err = learner.handle_answer(&submit(1, json!(2))).unwrap_err();
        assert!(matches!(err, LearnerError::InvalidLabel { label: 2 }));
        assert_eq!(learner.dataset().load().unwrap(), before);

        for (id, label) in [(1, 1), (2, 0), (3, 1)] {
            learner.handle_answer(&submit(id, json!(label))).unwrap();
        }
        let report = learner
            .handle_answer(&submit(4, json!("0")))
            .unwrap()
            .train_result
            .unwrap();
        assert_eq!(report.f1_history.len(), 1);
    }

    #[test]
    fn held_out_labels_are_saved_but_not_trained_on() {
        let learner = learner(30, 20);
        for (id, label) in [(1, 1), (2, 0), (21, 1), (22, 0)] {
            learner.handle_answer(&submit(id, json!(label))).unwrap();
        }
        let table = learner.dataset().load().unwrap();
        assert_eq!(table.labeled_count(), 4);
        let held_out: HashSet<DocumentId> =
            learner.eval_split.load().unwrap().ids().into_iter().collect();
        assert_eq!(labeled_held_out(&table, &held_out), vec![21, 22]);
        assert_eq!(table.labeled_subset(&held_out).ids(), vec![1, 2]);
    }

    #[test]
    fn unknown_document_is_not_found() {
        let learner = learner(10, 8);
        let err = learner.handle_answer(&submit(99, json!(1))).unwrap_err();
        assert!(matches!(err, LearnerError::NotFound { id: 99 }));
    }

    #[test]
    fn complete_update_scores_and_positions_every_document() {
        let learner = learner(24, 12);
        let response = learner.handle_complete_update().unwrap();
        assert_eq!(response.algorithm, "umap");
        assert_eq!(response.positions.len(), 24);
        assert_eq!(response.positions[0].id, 1);
        let table = learner.dataset().load().unwrap();
        assert!(table.rows().iter().all(|row| (0.0..=1.0).contains(&row.score)));
        assert!(table.rows().iter().all(|row| row.label == UNLABELED));
        assert!(learner.seeds.load().unwrap().is_some());
    }

    #[test]
    fn repeated_update_from_stored_seed_is_stable() {
        let learner = learner(24, 12);
        learner.handle_complete_update().unwrap();
        let seed = learner.seeds.load().unwrap().unwrap();
        let second = learner.handle_complete_update().unwrap();
        // Restore the first seed and run again: same inputs, same output.
        learner.seeds.save(seed.view()).unwrap();
        let third = learner.handle_complete_update().unwrap();
        assert_eq!(second, third);
    }

    #[test]
    fn reset_clears_labels() {
        let learner = learner(12, 10);
        for id in 1..=6 {
            learner.handle_answer(&submit(id, json!(id % 2))).unwrap();
        }
        let table = learner.reset_train_data().unwrap();
        assert_eq!(table.labeled_count(), 0);
        assert!(table.rows().iter().all(|row| row.label == UNLABELED));
        assert_eq!(learner.reset_train_data().unwrap(), table);
    }

    #[test]
    fn import_builds_table_and_split() {
        let documents: Vec<Value> = (0..12)
            .map(|idx| {
                json!({
                    "id": idx + 100,
                    "values": {"7": text(idx)},
                    "features": {"1": {"4": if idx % 2 == 0 { 0.8 } else { 0.2 }}}
                })
            })
            .collect();
        let mut settings = settings();
        settings.import.eval_split_start = 8;
        let learner = ActiveLearner::new(
            MemoryTableStore::default(),
            MemoryTableStore::default(),
            MemoryHistoryLog::default(),
            MemorySeedStore::default(),
            settings,
        );
        let summary = learner.import_documents(&documents).unwrap();
        assert_eq!(summary, ImportSummary { documents: 12, eval_split: 4 });
        let table = learner.dataset().load().unwrap();
        assert_eq!(table.labeled_count(), 0);
        assert!(table.rows().iter().any(|row| row.score > 0.0));
        let eval = learner.eval_split.load().unwrap();
        assert_eq!(eval.labels(), vec![1, 0, 1, 0]);
    }
}

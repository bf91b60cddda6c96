use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{ExportKeys, ImportOptions};
use crate::embedding::EmbeddingParams;
use crate::ml::ClassifierKind;
use crate::text::TfidfParams;

/// Everything configurable, one TOML table per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub vectorizer: TfidfParams,
    #[serde(default)]
    pub import: ImportOptions,
    #[serde(default)]
    pub export: ExportKeys,
    #[serde(default)]
    pub embedding: EmbeddingParams,
}

impl Settings {
    /// Replace out-of-range values with usable ones.
    pub fn normalized(mut self) -> Self {
        self.vectorizer = self.vectorizer.normalized();
        self.embedding = self.embedding.normalized();
        if !self.import.positive_threshold.is_finite() {
            self.import.positive_threshold = ImportOptions::default().positive_threshold;
        }
        self
    }
}

/// Data file locations. Relative file names are resolved against `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Defaults to the `data` folder of the application directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,
    #[serde(default = "default_eval_split")]
    pub eval_split: PathBuf,
    #[serde(default = "default_metrics")]
    pub metrics: PathBuf,
    #[serde(default = "default_seed")]
    pub embedding_seed: PathBuf,
    /// Document-feature JSON read by `import`.
    #[serde(default = "default_source_json")]
    pub source_json: PathBuf,
    /// Document-feature JSON written by a full update.
    #[serde(default = "default_export_json")]
    pub export_json: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            dataset: default_dataset(),
            eval_split: default_eval_split(),
            metrics: default_metrics(),
            embedding_seed: default_seed(),
            source_json: default_source_json(),
            export_json: default_export_json(),
        }
    }
}

impl PathsConfig {
    pub fn resolve(&self, data_dir: &Path) -> ResolvedPaths {
        let base = self.data_dir.as_deref().unwrap_or(data_dir);
        ResolvedPaths {
            dataset: base.join(&self.dataset),
            eval_split: base.join(&self.eval_split),
            metrics: base.join(&self.metrics),
            embedding_seed: base.join(&self.embedding_seed),
            source_json: base.join(&self.source_json),
            export_json: base.join(&self.export_json),
        }
    }
}

/// Absolute file locations after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub dataset: PathBuf,
    pub eval_split: PathBuf,
    pub metrics: PathBuf,
    pub embedding_seed: PathBuf,
    pub source_json: PathBuf,
    pub export_json: PathBuf,
}

fn default_dataset() -> PathBuf {
    PathBuf::from("data.csv")
}

fn default_eval_split() -> PathBuf {
    PathBuf::from("eval_split.csv")
}

fn default_metrics() -> PathBuf {
    PathBuf::from("metrics.csv")
}

fn default_seed() -> PathBuf {
    PathBuf::from("embedding_seed.csv")
}

fn default_source_json() -> PathBuf {
    PathBuf::from("documents.json")
}

fn default_export_json() -> PathBuf {
    PathBuf::from("documents_labeled.json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_training_classifier")]
    pub classifier: ClassifierKind,
    /// Training runs once strictly more than this many documents are labeled.
    #[serde(default = "default_min_labeled")]
    pub min_labeled: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            classifier: default_training_classifier(),
            min_labeled: default_min_labeled(),
        }
    }
}

fn default_training_classifier() -> ClassifierKind {
    ClassifierKind::Sgd
}

fn default_min_labeled() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_scoring_classifier")]
    pub classifier: ClassifierKind,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            classifier: default_scoring_classifier(),
        }
    }
}

fn default_scoring_classifier() -> ClassifierKind {
    ClassifierKind::NaiveBayes
}

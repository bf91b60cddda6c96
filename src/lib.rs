//! Active-learning label scoring for a document visualization front end.
//!
//! Documents are labeled one at a time; once enough labels exist a classifier is retrained and
//! evaluated against a fixed held-out split. A full update rescores every document by
//! classification uncertainty and recomputes a 2-D layout seeded by the previous one.

/// Application directory resolution.
pub mod app_dirs;
/// `config.toml` loading and saving.
pub mod config;
/// Document table, held-out split and document-feature JSON.
pub mod dataset;
/// Neighbor-graph layout with positional continuity.
pub mod embedding;
pub mod error;
/// Metrics history log.
pub mod history;
/// Label ingestion.
pub mod labeling;
/// Tracing setup.
pub mod logging;
/// Classifiers and evaluation metrics.
pub mod ml;
pub mod scoring;
/// Orchestration of the labeling loop.
pub mod session;
/// TF-IDF text features.
pub mod text;
pub mod training;

pub use error::LearnerError;
pub use session::{ActiveLearner, AnswerResponse, FileLearner, LabelSubmission, UpdateResponse};

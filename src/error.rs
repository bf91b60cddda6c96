//! Errors surfaced by the active-learning operations.

use thiserror::Error;

use crate::dataset::{DocumentId, StoreError};
use crate::embedding::EmbeddingError;
use crate::ml::ClassifierError;
use crate::text::TextError;

#[derive(Debug, Error)]
pub enum LearnerError {
    /// A label was submitted for an id that is not in the document table.
    #[error("document {id} not found")]
    NotFound { id: DocumentId },
    /// The metrics history was queried before any training happened.
    #[error("metrics history is empty")]
    EmptyHistory,
    /// Loading or saving a persisted file failed.
    #[error("store I/O failed: {0}")]
    StoreIo(#[from] StoreError),
    /// Too little (or too uniform) labeled data to fit a classifier.
    #[error("insufficient training data: {reason}")]
    InsufficientData { reason: String },
    #[error("label {label} is not a binary class (expected 0 or 1)")]
    InvalidLabel { label: i64 },
    #[error("answer {answer} is not an integer class label")]
    MalformedAnswer { answer: String },
    /// The document-feature JSON does not have the expected shape.
    #[error("invalid document-feature JSON: {message}")]
    FeatureJson { message: String },
    #[error("classifier failed: {0}")]
    Classifier(ClassifierError),
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl LearnerError {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }
}

impl From<ClassifierError> for LearnerError {
    fn from(error: ClassifierError) -> Self {
        match error {
            ClassifierError::EmptyTrainingSet | ClassifierError::SingleClass { .. } => {
                Self::insufficient(error.to_string())
            }
            other => Self::Classifier(other),
        }
    }
}

impl From<TextError> for LearnerError {
    fn from(error: TextError) -> Self {
        Self::insufficient(error.to_string())
    }
}

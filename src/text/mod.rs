//! Text feature extraction.

pub mod tfidf;
pub mod tokenize;

use thiserror::Error;

pub use tfidf::{FeatureMatrix, TfidfParams, TfidfVectorizer};

#[derive(Debug, Error)]
pub enum TextError {
    #[error("cannot fit a vocabulary on zero documents")]
    EmptyCorpus,
    #[error("documents contain no tokens")]
    EmptyVocabulary,
    #[error("every term occurs in more than {max_df} of the documents; no terms remain")]
    AllTermsPruned { max_df: f64 },
}

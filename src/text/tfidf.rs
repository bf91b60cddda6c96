//! TF-IDF weighting fitted on one corpus and applied to any other.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};

use super::TextError;
use super::tokenize::tokenize;

/// Row-major sparse document/term matrix.
pub type FeatureMatrix = CsMat<f64>;

/// Vectorizer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfParams {
    /// Terms present in more than this fraction of fitted documents are dropped.
    #[serde(default = "default_max_df")]
    pub max_df: f64,
    /// Replace raw counts with `1 + ln(count)`.
    #[serde(default = "default_true")]
    pub sublinear_tf: bool,
    /// Fold accented characters to ASCII before tokenizing.
    #[serde(default = "default_true")]
    pub strip_accents: bool,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            max_df: default_max_df(),
            sublinear_tf: default_true(),
            strip_accents: default_true(),
        }
    }
}

impl TfidfParams {
    pub(crate) fn normalized(mut self) -> Self {
        if !self.max_df.is_finite() || self.max_df <= 0.0 {
            self.max_df = default_max_df();
        }
        self.max_df = self.max_df.min(1.0);
        self
    }
}

fn default_max_df() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

/// Fitted vocabulary and inverse document frequencies.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    params: TfidfParams,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and IDF weights from `texts`.
    ///
    /// The vocabulary is sorted alphabetically, so column order does not depend on the order
    /// of the input documents.
    pub fn fit<S: AsRef<str>>(texts: &[S], params: &TfidfParams) -> Result<Self, TextError> {
        if texts.is_empty() {
            return Err(TextError::EmptyCorpus);
        }
        let params = params.clone().normalized();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let mut tokens = tokenize(text.as_ref(), params.strip_accents);
            tokens.sort_unstable();
            tokens.dedup();
            for token in tokens {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }
        if document_frequency.is_empty() {
            return Err(TextError::EmptyVocabulary);
        }

        let n_docs = texts.len() as f64;
        let max_doc_count = params.max_df * n_docs;
        let mut kept: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| (*df as f64) <= max_doc_count)
            .collect();
        if kept.is_empty() {
            return Err(TextError::AllTermsPruned {
                max_df: params.max_df,
            });
        }
        kept.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (column, (term, df)) in kept.into_iter().enumerate() {
            idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, column);
        }
        tracing::debug!(terms = idf.len(), documents = texts.len(), "Fitted TF-IDF vocabulary");
        Ok(Self {
            params,
            vocabulary,
            idf,
        })
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Map `texts` to L2-normalized TF-IDF rows; unknown terms are ignored.
    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> FeatureMatrix {
        let mut triplets = TriMat::new((texts.len(), self.n_features()));
        for (row, text) in texts.iter().enumerate() {
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for token in tokenize(text.as_ref(), self.params.strip_accents) {
                if let Some(&column) = self.vocabulary.get(&token) {
                    *counts.entry(column).or_insert(0) += 1;
                }
            }
            let mut entries: Vec<(usize, f64)> = counts
                .into_iter()
                .map(|(column, count)| {
                    let tf = if self.params.sublinear_tf {
                        1.0 + (count as f64).ln()
                    } else {
                        count as f64
                    };
                    (column, tf * self.idf[column])
                })
                .collect();
            entries.sort_unstable_by_key(|(column, _)| *column);
            let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (column, value) in entries {
                triplets.add_triplet(row, column, value / norm);
            }
        }
        triplets.to_csr()
    }

    pub fn fit_transform<S: AsRef<str>>(
        texts: &[S],
        params: &TfidfParams,
    ) -> Result<(Self, FeatureMatrix), TextError> {
        let vectorizer = Self::fit(texts, params)?;
        let matrix = vectorizer.transform(texts);
        Ok((vectorizer, matrix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "konzert heute abend im park",
            "konzert mit band und chor",
            "fussball spiel heute",
            "markt am samstag",
        ]
    }

    #[test]
    fn drops_terms_above_max_df() {
        let params = TfidfParams {
            max_df: 0.4,
            ..TfidfParams::default()
        };
        let vectorizer = TfidfVectorizer::fit(&corpus(), &params).unwrap();
        // "konzert" and "heute" occur in 2 of 4 documents.
        assert!(vectorizer.column("konzert").is_none());
        assert!(vectorizer.column("heute").is_none());
        assert!(vectorizer.column("park").is_some());
    }

    #[test]
    fn rows_are_unit_length() {
        let (_, matrix) = TfidfVectorizer::fit_transform(&corpus(), &TfidfParams::default()).unwrap();
        for row in matrix.outer_iterator() {
            let norm: f64 = row.data().iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn idf_is_smoothed() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), &TfidfParams::default()).unwrap();
        let column = vectorizer.column("park").unwrap();
        let expected = (5.0f64 / 2.0).ln() + 1.0;
        assert!((vectorizer.idf()[column] - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_documents_become_empty_rows() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), &TfidfParams::default()).unwrap();
        let matrix = vectorizer.transform(&["völlig unbekannt"]);
        assert_eq!(matrix.rows(), 1);
        assert_eq!(matrix.nnz(), 0);
    }

    #[test]
    fn sublinear_scaling_dampens_repeats() {
        let texts = ["park park park park band", "chor"];
        let params = TfidfParams {
            max_df: 1.0,
            ..TfidfParams::default()
        };
        let vectorizer = TfidfVectorizer::fit(&texts, &params).unwrap();
        let matrix = vectorizer.transform(&texts[..1]);
        let row = matrix.outer_view(0).unwrap();
        let park = *row.get(vectorizer.column("park").unwrap()).unwrap();
        let band = *row.get(vectorizer.column("band").unwrap()).unwrap();
        let expected_ratio = 1.0 + 4.0f64.ln();
        assert!((park / band - expected_ratio).abs() < 1e-9);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let texts: [&str; 0] = [];
        assert!(matches!(
            TfidfVectorizer::fit(&texts, &TfidfParams::default()),
            Err(TextError::EmptyCorpus)
        ));
        assert!(matches!(
            TfidfVectorizer::fit(&["a b c"], &TfidfParams::default()),
            Err(TextError::EmptyVocabulary)
        ));
    }
}

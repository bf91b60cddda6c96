//! Two-dimensional document layout with positional continuity across runs.
//!
//! The layout is a neighbor-graph projection: exact cosine kNN over the TF-IDF rows, a fuzzy
//! symmetric membership graph (optionally biased by known labels), then a seeded stochastic
//! gradient layout. A previous layout with the same number of rows is used as the starting
//! point so that small dataset changes produce small movements.

pub mod graph;
pub mod init;
pub mod layout;
pub mod seed;

use linfa_reduction::ReductionError;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::FeatureMatrix;
use layout::{Curve, LayoutOptions};

pub use seed::{CsvSeedStore, MemorySeedStore, SeedStore};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("need at least {min} documents to embed, found {found}", min = MIN_SAMPLES)]
    TooFewSamples { found: usize },
    #[error("feature matrix has {rows} rows but {labels} labels were given")]
    LabelMismatch { rows: usize, labels: usize },
    #[error("expected a {expected:?} layout, got {found:?}")]
    Shape {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("initial layout collapsed to a single point")]
    Degenerate,
    #[error("principal component initialization failed: {0}")]
    Reduction(#[from] ReductionError),
    #[error("layout produced non-finite coordinates")]
    NonFinite,
}

/// Smallest corpus that can be embedded.
pub const MIN_SAMPLES: usize = 2;

/// Embedding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingParams {
    #[serde(default = "default_neighbors")]
    pub n_neighbors: usize,
    #[serde(default = "default_min_dist")]
    pub min_dist: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_negative_samples")]
    pub negative_samples: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// 0 ignores labels, 1 cuts every edge between documents with different labels.
    #[serde(default = "default_label_influence")]
    pub label_influence: f64,
    /// Start from the stored layout when its row count matches.
    #[serde(default = "default_use_previous")]
    pub use_previous_positions: bool,
    /// Factor applied to returned positions; the stored seed stays unscaled.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self {
            n_neighbors: default_neighbors(),
            min_dist: default_min_dist(),
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            negative_samples: default_negative_samples(),
            seed: default_seed(),
            label_influence: default_label_influence(),
            use_previous_positions: default_use_previous(),
            scale: default_scale(),
        }
    }
}

impl EmbeddingParams {
    pub(crate) fn normalized(mut self) -> Self {
        self.n_neighbors = self.n_neighbors.max(2);
        if !self.min_dist.is_finite() || self.min_dist < 0.0 {
            self.min_dist = default_min_dist();
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            self.learning_rate = default_learning_rate();
        }
        self.negative_samples = self.negative_samples.max(1);
        self.label_influence = if self.label_influence.is_finite() {
            self.label_influence.clamp(0.0, 1.0)
        } else {
            default_label_influence()
        };
        if !self.scale.is_finite() || self.scale == 0.0 {
            self.scale = default_scale();
        }
        self
    }
}

fn default_neighbors() -> usize {
    15
}

fn default_min_dist() -> f64 {
    0.8
}

fn default_learning_rate() -> f64 {
    0.5
}

fn default_epochs() -> usize {
    200
}

fn default_negative_samples() -> usize {
    5
}

fn default_seed() -> u64 {
    1
}

fn default_label_influence() -> f64 {
    0.5
}

fn default_use_previous() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}

/// Compute an unscaled `(rows, 2)` layout of `features`.
///
/// `labels` (with `-1` for unlabeled rows) bias neighbor weights when given. A `seed` whose row
/// count differs from the feature matrix is ignored with a warning.
pub fn embed(
    features: &FeatureMatrix,
    labels: Option<&[i64]>,
    seed: Option<ArrayView2<'_, f64>>,
    params: &EmbeddingParams,
) -> Result<Array2<f64>, EmbeddingError> {
    let n = features.rows();
    if n < MIN_SAMPLES {
        return Err(EmbeddingError::TooFewSamples { found: n });
    }
    if let Some(labels) = labels
        && labels.len() != n
    {
        return Err(EmbeddingError::LabelMismatch {
            rows: n,
            labels: labels.len(),
        });
    }
    let k = params.n_neighbors.min(n - 1);
    let neighbors = graph::knn(features, k);
    let edges = graph::fuzzy_graph(&neighbors, labels, params.label_influence);
    tracing::debug!(rows = n, neighbors = k, edges = edges.len(), "Built neighbor graph");

    let mut positions = match seed {
        Some(seed) if seed.dim() == (n, 2) && seed.iter().all(|v| v.is_finite()) => {
            tracing::debug!("Starting from previous layout");
            seed.rows().into_iter().map(|row| [row[0], row[1]]).collect()
        }
        other => {
            if let Some(seed) = other {
                tracing::warn!(
                    expected = n,
                    found = seed.nrows(),
                    "Ignoring stored layout that does not match the document count"
                );
            }
            initial_positions(n, &edges, params.seed)
        }
    };

    let options = LayoutOptions {
        epochs: params.epochs,
        learning_rate: params.learning_rate,
        negative_samples: params.negative_samples,
        seed: params.seed,
    };
    layout::optimize(&mut positions, &edges, Curve::fit(params.min_dist), options);

    let flat: Vec<f64> = positions.into_iter().flatten().collect();
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::NonFinite);
    }
    Array2::from_shape_vec((n, 2), flat).map_err(|_| EmbeddingError::Shape {
        expected: (n, 2),
        found: (n, 0),
    })
}

fn initial_positions(n: usize, edges: &[graph::Edge], seed: u64) -> Vec<[f64; 2]> {
    match init::structural_init(n, edges, seed) {
        Ok(positions) => positions,
        Err(err) => {
            tracing::debug!("Falling back to random initialization: {err}");
            init::random_init(n, seed)
        }
    }
}

/// Multiply every coordinate by `factor`.
pub fn scale_positions(positions: &Array2<f64>, factor: f64) -> Array2<f64> {
    positions * factor
}

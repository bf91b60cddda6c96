//! Starting layouts when no usable seed is available.

use linfa::DatasetBase;
use linfa::traits::{Fit, Predict};
use linfa_reduction::Pca;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::EmbeddingError;
use super::graph::Edge;

/// Half-width of the box initial layouts are scaled into.
pub const INIT_EXTENT: f64 = 10.0;
const NOISE: f64 = 1e-4;

/// Uniform positions in `[-INIT_EXTENT, INIT_EXTENT]`.
pub fn random_init(n_samples: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples)
        .map(|_| {
            [
                (rng.random::<f64>() * 2.0 - 1.0) * INIT_EXTENT,
                (rng.random::<f64>() * 2.0 - 1.0) * INIT_EXTENT,
            ]
        })
        .collect()
}

/// First two principal components of the dense affinity matrix.
///
/// Rescaled so the largest coordinate magnitude is `INIT_EXTENT`, with a little seeded jitter so
/// coincident documents do not start on the same point.
pub fn structural_init(
    n_samples: usize,
    edges: &[Edge],
    seed: u64,
) -> Result<Vec<[f64; 2]>, EmbeddingError> {
    if n_samples < 3 {
        return Err(EmbeddingError::TooFewSamples { found: n_samples });
    }
    let mut affinity = Array2::<f64>::zeros((n_samples, n_samples));
    for edge in edges {
        affinity[[edge.head, edge.tail]] = edge.weight;
    }
    for i in 0..n_samples {
        affinity[[i, i]] = 1.0;
    }
    let dataset = DatasetBase::from(affinity.clone());
    let pca = Pca::params(2).fit(&dataset)?;
    let projected: Array2<f64> = pca.predict(&affinity);
    if projected.ncols() != 2 || projected.nrows() != n_samples {
        return Err(EmbeddingError::Shape {
            expected: (n_samples, 2),
            found: projected.dim(),
        });
    }
    let extent = projected.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if !extent.is_finite() || extent <= f64::EPSILON {
        return Err(EmbeddingError::Degenerate);
    }
    let expansion = INIT_EXTENT / extent;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(projected
        .rows()
        .into_iter()
        .map(|row| {
            [
                row[0] * expansion + (rng.random::<f64>() - 0.5) * NOISE,
                row[1] * expansion + (rng.random::<f64>() - 0.5) * NOISE,
            ]
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_init_is_seeded_and_bounded() {
        let first = random_init(20, 3);
        assert_eq!(first, random_init(20, 3));
        assert_ne!(first, random_init(20, 4));
        assert!(
            first
                .iter()
                .flatten()
                .all(|v| v.abs() <= INIT_EXTENT)
        );
    }

    #[test]
    fn structural_init_separates_components() {
        // Two triangles joined by one weak edge.
        let mut edges = Vec::new();
        for (h, t, weight) in [
            (0, 1, 1.0),
            (1, 2, 0.6),
            (0, 2, 0.8),
            (3, 4, 0.9),
            (4, 5, 0.7),
            (3, 5, 0.5),
            (2, 3, 0.05),
        ] {
            edges.push(Edge { head: h, tail: t, weight });
            edges.push(Edge { head: t, tail: h, weight });
        }
        let layout = structural_init(6, &edges, 1).unwrap();
        let dist = |a: [f64; 2], b: [f64; 2]| ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
        assert!(dist(layout[0], layout[1]) < dist(layout[0], layout[3]));
        assert!(
            layout
                .iter()
                .flatten()
                .all(|v| v.abs() <= INIT_EXTENT + 1.0)
        );
    }

    #[test]
    fn structural_init_needs_three_samples() {
        assert!(matches!(
            structural_init(2, &[], 1),
            Err(EmbeddingError::TooFewSamples { found: 2 })
        ));
    }
}

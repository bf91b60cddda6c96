//! Fuzzy nearest-neighbor graph over sparse document vectors.

use std::collections::BTreeMap;

use crate::dataset::UNLABELED;
use crate::text::FeatureMatrix;

const SMOOTH_ITERATIONS: usize = 64;
const SMOOTH_TOLERANCE: f64 = 1e-5;
const MIN_SIGMA_SCALE: f64 = 1e-3;
/// Distance assigned to edges touching an unlabeled document.
const UNKNOWN_LABEL_DIST: f64 = 1.0;

/// One directed, weighted edge of the symmetric graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub head: usize,
    pub tail: usize,
    pub weight: f64,
}

/// Exact `k` nearest neighbors by cosine distance, nearest first.
///
/// Ties are broken by row index. Rows without any nonzero entry sit at distance 1 from all others.
pub fn knn(features: &FeatureMatrix, k: usize) -> Vec<Vec<(usize, f64)>> {
    let n = features.rows();
    let norms: Vec<f64> = features
        .outer_iterator()
        .map(|row| row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt())
        .collect();
    let by_column = features.to_csc();
    let mut out = Vec::with_capacity(n);
    let mut dots = vec![0.0; n];
    for (i, row) in features.outer_iterator().enumerate() {
        dots.iter_mut().for_each(|d| *d = 0.0);
        for (col, value) in row.iter() {
            if let Some(column) = by_column.outer_view(col) {
                for (other, weight) in column.iter() {
                    dots[other] += value * weight;
                }
            }
        }
        let mut candidates: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| {
                let denom = norms[i] * norms[j];
                let distance = if denom > 0.0 {
                    (1.0 - dots[j] / denom).clamp(0.0, 2.0)
                } else {
                    1.0
                };
                (j, distance)
            })
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        candidates.truncate(k);
        out.push(candidates);
    }
    out
}

/// Per-row `(rho, sigma)` so that the neighbor memberships sum to `log2(k)`.
fn smooth_distances(neighbors: &[(usize, f64)], mean_distance: f64) -> (f64, f64) {
    let k = neighbors.len();
    if k == 0 {
        return (0.0, 1.0);
    }
    let target = (k as f64).log2();
    let rho = neighbors
        .iter()
        .map(|&(_, d)| d)
        .find(|&d| d > 0.0)
        .unwrap_or(0.0);
    let mut lo = 0.0;
    let mut hi = f64::INFINITY;
    let mut sigma = 1.0;
    for _ in 0..SMOOTH_ITERATIONS {
        let total: f64 = neighbors
            .iter()
            .map(|&(_, d)| (-(d - rho).max(0.0) / sigma).exp())
            .sum();
        if (total - target).abs() < SMOOTH_TOLERANCE {
            break;
        }
        if total > target {
            hi = sigma;
            sigma = (lo + hi) / 2.0;
        } else {
            lo = sigma;
            sigma = if hi.is_infinite() { sigma * 2.0 } else { (lo + hi) / 2.0 };
        }
    }
    let local_mean = neighbors.iter().map(|&(_, d)| d).sum::<f64>() / k as f64;
    let floor = if rho > 0.0 { local_mean } else { mean_distance } * MIN_SIGMA_SCALE;
    (rho, sigma.max(floor))
}

/// Symmetric fuzzy union of the kNN memberships, optionally biased by labels.
///
/// Edges between documents with different known labels are weakened by
/// `exp(-2.5 / (1 - label_influence))`; an influence of `1` removes them. Edges touching an
/// unlabeled document are scaled uniformly. Weights are rescaled so the strongest edge is 1.
pub fn fuzzy_graph(
    neighbors: &[Vec<(usize, f64)>],
    labels: Option<&[i64]>,
    label_influence: f64,
) -> Vec<Edge> {
    let count: usize = neighbors.iter().map(Vec::len).sum();
    let mean_distance = if count == 0 {
        1.0
    } else {
        neighbors.iter().flatten().map(|&(_, d)| d).sum::<f64>() / count as f64
    };
    let mut directed: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (i, row) in neighbors.iter().enumerate() {
        let (rho, sigma) = smooth_distances(row, mean_distance);
        for &(j, d) in row {
            let membership = (-(d - rho).max(0.0) / sigma).exp();
            directed.insert((i, j), membership);
        }
    }

    let mut symmetric: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (&(i, j), &w) in &directed {
        let back = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let union = w + back - w * back;
        symmetric.insert((i, j), union);
        symmetric.insert((j, i), union);
    }

    if let Some(labels) = labels {
        let far = if label_influence >= 1.0 {
            f64::INFINITY
        } else {
            2.5 / (1.0 - label_influence.max(0.0))
        };
        for (&(i, j), weight) in symmetric.iter_mut() {
            let (a, b) = (labels[i], labels[j]);
            if a == UNLABELED || b == UNLABELED {
                *weight *= (-UNKNOWN_LABEL_DIST).exp();
            } else if a != b {
                *weight *= (-far).exp();
            }
        }
    }

    let max = symmetric.values().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    symmetric
        .into_iter()
        .filter(|&(_, w)| w > 0.0)
        .map(|((head, tail), w)| Edge {
            head,
            tail,
            weight: w / max,
        })
        .collect()
}

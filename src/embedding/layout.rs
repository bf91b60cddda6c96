//! Stochastic gradient layout of a weighted graph in two dimensions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::graph::Edge;

const SPREAD: f64 = 1.0;
const CURVE_SAMPLES: usize = 300;
const GRADIENT_CLIP: f64 = 4.0;

/// Parameters of the low-dimensional similarity curve `1 / (1 + a * d^(2b))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    pub a: f64,
    pub b: f64,
}

impl Curve {
    pub fn fit(min_dist: f64) -> Self {
        let xs: Vec<f64> = (0..CURVE_SAMPLES)
            .map(|i| 3.0 * SPREAD * i as f64 / (CURVE_SAMPLES - 1) as f64)
            .collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|&x| {
                if x < min_dist {
                    1.0
                } else {
                    (-(x - min_dist) / SPREAD).exp()
                }
            })
            .collect();
        let error = |a: f64, b: f64| -> f64 {
            xs.iter()
                .zip(&ys)
                .map(|(&x, &y)| {
                    let fitted = 1.0 / (1.0 + a * x.powf(2.0 * b));
                    (fitted - y).powi(2)
                })
                .sum()
        };
        let (mut best_a, mut best_b) = (1.0, 1.0);
        let mut best = error(best_a, best_b);
        // Coarse log-spaced grid for `a`, linear for `b`, then two refinement passes.
        let (mut log_a_lo, mut log_a_hi) = (-3.0f64, 3.0f64);
        let (mut b_lo, mut b_hi) = (0.1f64, 3.0f64);
        for _ in 0..3 {
            let steps = 60;
            for ia in 0..=steps {
                let a = (log_a_lo + (log_a_hi - log_a_lo) * ia as f64 / steps as f64).exp();
                for ib in 0..=steps {
                    let b = b_lo + (b_hi - b_lo) * ib as f64 / steps as f64;
                    let e = error(a, b);
                    if e < best {
                        best = e;
                        best_a = a;
                        best_b = b;
                    }
                }
            }
            let log_a_step = (log_a_hi - log_a_lo) / steps as f64;
            let b_step = (b_hi - b_lo) / steps as f64;
            log_a_lo = best_a.ln() - 2.0 * log_a_step;
            log_a_hi = best_a.ln() + 2.0 * log_a_step;
            b_lo = (best_b - 2.0 * b_step).max(0.01);
            b_hi = best_b + 2.0 * b_step;
        }
        Self {
            a: best_a,
            b: best_b,
        }
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub negative_samples: usize,
    pub seed: u64,
}

fn clip(value: f64) -> f64 {
    value.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

fn squared_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Move `positions` so graph neighbors attract and random pairs repel.
pub fn optimize(positions: &mut [[f64; 2]], edges: &[Edge], curve: Curve, options: LayoutOptions) {
    let n = positions.len();
    if n < 2 || edges.is_empty() || options.epochs == 0 {
        return;
    }
    let Curve { a, b } = curve;
    let max_weight = edges.iter().map(|e| e.weight).fold(0.0, f64::max);
    let epochs = options.epochs as f64;
    // Edges too weak to be sampled once during the run are skipped.
    let epochs_per_sample: Vec<f64> = edges
        .iter()
        .map(|e| {
            if e.weight * epochs / max_weight < 1.0 {
                -1.0
            } else {
                max_weight / e.weight
            }
        })
        .collect();
    let negative_rate = options.negative_samples.max(1) as f64;
    let epochs_per_negative: Vec<f64> = epochs_per_sample.iter().map(|e| e / negative_rate).collect();
    let mut next_sample = epochs_per_sample.clone();
    let mut next_negative = epochs_per_negative.clone();
    let mut rng = StdRng::seed_from_u64(options.seed);

    for epoch in 0..options.epochs {
        let epoch = epoch as f64;
        let alpha = options.learning_rate * (1.0 - epoch / epochs);
        for (idx, edge) in edges.iter().enumerate() {
            if epochs_per_sample[idx] <= 0.0 || next_sample[idx] > epoch {
                continue;
            }
            let (j, k) = (edge.head, edge.tail);
            let current = positions[j];
            let other = positions[k];
            let dist_sq = squared_distance(current, other);
            let coeff = if dist_sq > 0.0 {
                -2.0 * a * b * dist_sq.powf(b - 1.0) / (a * dist_sq.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..2 {
                let grad = clip(coeff * (current[d] - other[d]));
                positions[j][d] += grad * alpha;
                positions[k][d] -= grad * alpha;
            }
            next_sample[idx] += epochs_per_sample[idx];

            let negatives = ((epoch - next_negative[idx]) / epochs_per_negative[idx]).floor();
            let negatives = if negatives > 0.0 { negatives as usize } else { 0 };
            for _ in 0..negatives {
                let other_idx = rng.random_range(0..n);
                if other_idx == j {
                    continue;
                }
                let current = positions[j];
                let other = positions[other_idx];
                let dist_sq = squared_distance(current, other);
                let coeff = if dist_sq > 0.0 {
                    2.0 * b / ((0.001 + dist_sq) * (a * dist_sq.powf(b) + 1.0))
                } else {
                    0.0
                };
                for d in 0..2 {
                    let grad = if coeff > 0.0 {
                        clip(coeff * (current[d] - other[d]))
                    } else {
                        GRADIENT_CLIP
                    };
                    positions[j][d] += grad * alpha;
                }
            }
            next_negative[idx] += negatives as f64 * epochs_per_negative[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitted_curve_tracks_target() {
        let curve = Curve::fit(0.1);
        let at = |x: f64| 1.0 / (1.0 + curve.a * x.powf(2.0 * curve.b));
        assert!(at(0.0) > 0.99);
        assert!(at(2.5) < 0.2);
        assert!(at(0.5) > at(1.0));
    }

    #[test]
    fn wider_min_dist_flattens_the_curve() {
        let tight = Curve::fit(0.1);
        let wide = Curve::fit(0.8);
        let at = |c: Curve, x: f64| 1.0 / (1.0 + c.a * x.powf(2.0 * c.b));
        assert!(at(wide, 0.6) > at(tight, 0.6));
    }

    fn two_clusters() -> (Vec<[f64; 2]>, Vec<Edge>) {
        let positions = vec![[0.0, 0.0], [5.0, 5.0], [0.5, 4.5], [4.5, 0.5]];
        let mut edges = Vec::new();
        for (h, t) in [(0, 1), (2, 3)] {
            edges.push(Edge { head: h, tail: t, weight: 1.0 });
            edges.push(Edge { head: t, tail: h, weight: 1.0 });
        }
        (positions, edges)
    }

    fn options() -> LayoutOptions {
        LayoutOptions {
            epochs: 100,
            learning_rate: 1.0,
            negative_samples: 2,
            seed: 7,
        }
    }

    #[test]
    fn connected_points_move_together() {
        let (mut positions, edges) = two_clusters();
        let before = squared_distance(positions[0], positions[1]);
        optimize(&mut positions, &edges, Curve::fit(0.1), options());
        assert!(squared_distance(positions[0], positions[1]) < before);
        assert!(positions.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn same_seed_same_layout() {
        let (mut first, edges) = two_clusters();
        let mut second = first.clone();
        let curve = Curve::fit(0.8);
        optimize(&mut first, &edges, curve, options());
        optimize(&mut second, &edges, curve, options());
        assert_eq!(first, second);
    }

    #[test]
    fn zero_epochs_leaves_positions() {
        let (mut positions, edges) = two_clusters();
        let before = positions.clone();
        optimize(
            &mut positions,
            &edges,
            Curve::fit(0.8),
            LayoutOptions {
                epochs: 0,
                ..options()
            },
        );
        assert_eq!(positions, before);
    }
}

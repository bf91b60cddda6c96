//! Classifiers and evaluation helpers used by training and scoring.
//!
//! Every algorithm implements [`Classifier`]; callers pick one through [`ClassifierKind`]
//! and construct a fresh instance per call.

pub mod classifier;
pub mod linear_svc;
pub mod logreg;
pub mod metrics;
pub mod naive_bayes;
pub mod pipeline;
pub mod sgd;

pub use classifier::{Classifier, ClassifierError, ClassifierKind};
pub use metrics::BinaryScores;
pub use pipeline::TextPipeline;

#[cfg(test)]
pub(crate) mod test_support {
    use sprs::TriMat;

    use crate::text::FeatureMatrix;

    pub fn separable() -> (FeatureMatrix, Vec<i64>) {
        let mut tri = TriMat::new((8, 4));
        let mut labels = Vec::new();
        for row in 0..8 {
            let positive = row % 2 == 0;
            let base = if positive { 0 } else { 2 };
            let lean = if row % 4 < 2 { 0.8 } else { 0.6 };
            let other = (1.0f64 - lean * lean).sqrt();
            tri.add_triplet(row, base, lean);
            tri.add_triplet(row, base + 1, other);
            labels.push(i64::from(positive));
        }
        (tri.to_csr(), labels)
    }
}

//! Classifier capability shared by every algorithm the loop can be configured with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::linear_svc::LinearSvc;
use super::logreg::LogisticRegression;
use super::naive_bayes::MultinomialNb;
use super::sgd::SgdClassifier;
use crate::text::FeatureMatrix;

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("classifier has not been fitted")]
    NotFitted,
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("feature matrix has {rows} rows but {labels} labels were given")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("training labels only contain class {class}; two classes are required")]
    SingleClass { class: i64 },
    #[error("label {label} is not a binary class (expected 0 or 1)")]
    UnsupportedLabel { label: i64 },
    #[error("expected {expected} feature columns, found {found}")]
    FeatureMismatch { expected: usize, found: usize },
    #[error("feature values must be non-negative")]
    NegativeFeature,
}

/// Binary text classifier over a sparse row-major feature matrix.
///
/// Labels are `0` and `1`; probabilities are returned as `[P(0), P(1)]` per row.
pub trait Classifier: fmt::Debug {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[i64]) -> Result<(), ClassifierError>;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError>;

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>, ClassifierError>;
}

/// Named classifier variants selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Linear SVM trained with hinge-loss stochastic gradient descent.
    Sgd,
    /// Multinomial naive Bayes.
    NaiveBayes,
    /// L2-regularized logistic regression.
    Logistic,
    /// Max-margin linear classifier (squared hinge, dual coordinate descent).
    LinearSvc,
}

impl ClassifierKind {
    /// Construct a fresh, unfitted classifier with default hyperparameters.
    pub fn build(self) -> Box<dyn Classifier> {
        match self {
            Self::Sgd => Box::new(SgdClassifier::default()),
            Self::NaiveBayes => Box::new(MultinomialNb::default()),
            Self::Logistic => Box::new(LogisticRegression::default()),
            Self::LinearSvc => Box::new(LinearSvc::default()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sgd => "sgd",
            Self::NaiveBayes => "naive_bayes",
            Self::Logistic => "logistic",
            Self::LinearSvc => "linear_svc",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sgd" => Ok(Self::Sgd),
            "naive_bayes" | "mnb" => Ok(Self::NaiveBayes),
            "logistic" | "lr" => Ok(Self::Logistic),
            "linear_svc" | "svc" => Ok(Self::LinearSvc),
            other => Err(format!("Unknown classifier: {other}")),
        }
    }
}

/// Validate a binary training set and return `±1` targets aligned with the rows.
pub(crate) fn signed_targets(
    features: &FeatureMatrix,
    labels: &[i64],
) -> Result<Vec<f64>, ClassifierError> {
    if labels.is_empty() || features.rows() == 0 {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    if features.rows() != labels.len() {
        return Err(ClassifierError::LengthMismatch {
            rows: features.rows(),
            labels: labels.len(),
        });
    }
    let mut seen = [false; 2];
    let mut targets = Vec::with_capacity(labels.len());
    for &label in labels {
        match label {
            0 => {
                seen[0] = true;
                targets.push(-1.0);
            }
            1 => {
                seen[1] = true;
                targets.push(1.0);
            }
            other => return Err(ClassifierError::UnsupportedLabel { label: other }),
        }
    }
    match seen {
        [true, true] => Ok(targets),
        [true, false] => Err(ClassifierError::SingleClass { class: 0 }),
        _ => Err(ClassifierError::SingleClass { class: 1 }),
    }
}

/// Weight vector plus intercept shared by the linear variants.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn check_columns(&self, features: &FeatureMatrix) -> Result<(), ClassifierError> {
        if features.cols() != self.weights.len() {
            return Err(ClassifierError::FeatureMismatch {
                expected: self.weights.len(),
                found: features.cols(),
            });
        }
        Ok(())
    }

    /// Signed distance-like score for each row.
    pub fn decision_function(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ClassifierError> {
        self.check_columns(features)?;
        Ok(features
            .outer_iterator()
            .map(|row| sparse_dot(row.indices(), row.data(), &self.weights) + self.bias)
            .collect())
    }

    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        Ok(self
            .decision_function(features)?
            .into_iter()
            .map(|score| i64::from(score > 0.0))
            .collect())
    }

    /// Logistic squash of the decision function.
    pub fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>, ClassifierError> {
        Ok(self
            .decision_function(features)?
            .into_iter()
            .map(|score| {
                let positive = sigmoid(score);
                [1.0 - positive, positive]
            })
            .collect())
    }
}

pub(crate) fn sparse_dot(indices: &[usize], data: &[f64], dense: &[f64]) -> f64 {
    indices
        .iter()
        .zip(data)
        .map(|(&idx, &value)| value * dense[idx])
        .sum()
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

//! Binary logistic regression over sparse TF-IDF rows.

use super::classifier::{Classifier, ClassifierError, LinearModel};
use crate::text::FeatureMatrix;

mod train;
pub use train::TrainOptions;
pub(crate) use train::train_logreg;

#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    pub options: TrainOptions,
    model: Option<LinearModel>,
}

impl LogisticRegression {
    pub fn new(options: TrainOptions) -> Self {
        Self {
            options,
            model: None,
        }
    }

    fn model(&self) -> Result<&LinearModel, ClassifierError> {
        self.model.as_ref().ok_or(ClassifierError::NotFitted)
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[i64]) -> Result<(), ClassifierError> {
        self.model = Some(train_logreg(features, labels, &self.options)?);
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        self.model()?.predict(features)
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>, ClassifierError> {
        self.model()?.predict_proba(features)
    }
}

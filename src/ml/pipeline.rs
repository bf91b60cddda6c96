//! TF-IDF representation chained with a classifier.

use super::classifier::Classifier;
use crate::error::LearnerError;
use crate::text::{TfidfParams, TfidfVectorizer};

/// A classifier together with the vectorizer fitted on its training texts.
#[derive(Debug)]
pub struct TextPipeline {
    vectorizer: TfidfVectorizer,
    classifier: Box<dyn Classifier>,
}

impl TextPipeline {
    /// Fit the vectorizer on `texts` only, then fit `classifier` on the resulting rows.
    pub fn fit<S: AsRef<str>>(
        texts: &[S],
        labels: &[i64],
        params: &TfidfParams,
        mut classifier: Box<dyn Classifier>,
    ) -> Result<Self, LearnerError> {
        let (vectorizer, features) = TfidfVectorizer::fit_transform(texts, params)?;
        classifier.fit(&features, labels)?;
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<i64>, LearnerError> {
        let features = self.vectorizer.transform(texts);
        Ok(self.classifier.predict(&features)?)
    }

    pub fn predict_proba<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<[f64; 2]>, LearnerError> {
        let features = self.vectorizer.transform(texts);
        Ok(self.classifier.predict_proba(&features)?)
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ClassifierKind;

    #[test]
    fn applies_training_vocabulary_to_new_texts() {
        let texts = [
            "konzert band musik",
            "konzert chor musik",
            "fussball spiel tor",
            "fussball liga tor",
        ];
        let labels = [1, 1, 0, 0];
        let params = TfidfParams {
            max_df: 1.0,
            ..TfidfParams::default()
        };
        let pipeline =
            TextPipeline::fit(&texts, &labels, &params, ClassifierKind::NaiveBayes.build()).unwrap();
        let predicted = pipeline
            .predict(&["musik und band", "ein tor in der liga"])
            .unwrap();
        assert_eq!(predicted, vec![1, 0]);
    }

    #[test]
    fn single_class_training_is_insufficient_data() {
        let err = TextPipeline::fit(
            &["konzert band", "konzert chor"],
            &[1, 1],
            &TfidfParams {
                max_df: 1.0,
                ..TfidfParams::default()
            },
            ClassifierKind::Sgd.build(),
        )
        .unwrap_err();
        assert!(matches!(err, LearnerError::InsufficientData { .. }));
    }
}

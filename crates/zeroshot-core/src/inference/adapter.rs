//! The inference adapter used by the HTTP layer.
//!
//! [`Predictor`] turns a classifier call into label/confidence pairs. Every
//! failure along the way (loading the model, tokenizing, the forward pass, a
//! remote error) is logged and reported as an empty list.

use std::sync::Arc;

use async_trait::async_trait;

use super::lifecycle::ClassifierSource;
use crate::error::InferenceResult;
use crate::types::LabelConfidence;

/// Produces ranked label/confidence pairs for one text.
///
/// An empty list means no prediction is available. `Err` is reserved for
/// failures outside inference itself; [`Predictor`] never returns it.
#[async_trait]
pub trait LabelPredictor: Send + Sync {
    async fn predict(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> InferenceResult<Vec<LabelConfidence>>;
}

/// Adapter over a [`ClassifierSource`].
pub struct Predictor {
    source: Arc<dyn ClassifierSource>,
}

impl Predictor {
    pub fn new(source: Arc<dyn ClassifierSource>) -> Self {
        Self { source }
    }

    /// Lifecycle policy of the underlying source.
    pub fn policy(&self) -> &str {
        self.source.policy()
    }

    async fn try_predict(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> InferenceResult<Vec<LabelConfidence>> {
        let classifier = self.source.acquire().await?;
        let start = std::time::Instant::now();
        let output = classifier.classify(text, candidate_labels).await?;
        tracing::trace!(
            "{} classified {} labels in {:?}",
            classifier.name(),
            candidate_labels.len(),
            start.elapsed()
        );
        Ok(output.into_pairs())
    }
}

#[async_trait]
impl LabelPredictor for Predictor {
    async fn predict(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> InferenceResult<Vec<LabelConfidence>> {
        match self.try_predict(text, candidate_labels).await {
            Ok(pairs) => Ok(pairs),
            Err(e) => {
                tracing::error!("Error in predict: {e}");
                Ok(Vec::new())
            }
        }
    }
}

//! Zero-shot classifier trait and its output type.
//!
//! Defines the interface every classifier backend implements. A backend
//! receives a text plus candidate labels and answers with two parallel
//! lists, ranked the way the backend ranks them.

use async_trait::async_trait;

use crate::error::InferenceResult;
use crate::types::LabelConfidence;

/// Ranked labels and their scores, as two parallel lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierOutput {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

impl ClassifierOutput {
    /// Zip labels and scores into pairs, keeping the classifier's order.
    ///
    /// Extra entries on the longer side are dropped.
    pub fn into_pairs(self) -> Vec<LabelConfidence> {
        self.labels
            .into_iter()
            .zip(self.scores)
            .map(|(label, confidence)| LabelConfidence { label, confidence })
            .collect()
    }
}

/// Trait that all zero-shot classifier backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn ZeroShotClassifier>` for dynamic dispatch).
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Backend name for logging (e.g., "onnx", "remote").
    fn name(&self) -> &str;

    /// Model identifier the backend is bound to.
    fn model(&self) -> &str;

    /// Score `candidate_labels` against `text`.
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> InferenceResult<ClassifierOutput>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Render the NLI hypothesis for one label.
pub fn hypothesis(template: &str, label: &str) -> String {
    template.replacen("{}", label, 1)
}

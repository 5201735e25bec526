//! Request and response types for zero-shot classification.
//!
//! These are the JSON shapes accepted and produced by the HTTP service, plus
//! the label/confidence pair the inference adapter yields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label reported when no prediction could be produced for a text.
pub const NO_PREDICTION: &str = "No prediction available";

/// Single-text classification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Text to classify
    pub text: String,

    /// Labels to rank; order and duplicates are passed through to the model
    pub candidate_labels: Vec<String>,
}

/// Batch classification request. The labels are shared by every text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchClassificationRequest {
    pub texts: Vec<String>,
    pub candidate_labels: Vec<String>,
}

/// One label with the confidence the model assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfidence {
    pub label: String,
    pub confidence: f32,
}

impl LabelConfidence {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Single-text classification response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    /// Label with the highest confidence
    pub predicted_label: String,

    /// Confidence for every label the model returned
    pub confidence_scores: HashMap<String, f32>,
}

impl ClassificationResponse {
    /// Build a response from adapter output.
    ///
    /// The predicted label is the first pair holding the maximum confidence.
    /// Returns `None` when `pairs` is empty.
    pub fn from_pairs(pairs: &[LabelConfidence]) -> Option<Self> {
        let confidences: Vec<f32> = pairs.iter().map(|p| p.confidence).collect();
        let best = crate::math::argmax(&confidences)?;

        Some(Self {
            predicted_label: pairs[best].label.clone(),
            confidence_scores: confidence_map(pairs),
        })
    }
}

/// One entry of a batch response.
///
/// `text` is present for real predictions and absent for the
/// [`NO_PREDICTION`] placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPrediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub predicted_label: String,

    pub confidence_scores: HashMap<String, f32>,
}

impl BatchPrediction {
    /// Build the entry for `text`, falling back to the placeholder when the
    /// adapter returned nothing.
    pub fn from_pairs(text: &str, pairs: &[LabelConfidence]) -> Self {
        match ClassificationResponse::from_pairs(pairs) {
            Some(response) => Self {
                text: Some(text.to_string()),
                predicted_label: response.predicted_label,
                confidence_scores: response.confidence_scores,
            },
            None => Self::unavailable(),
        }
    }

    /// The placeholder entry for a text without a prediction.
    pub fn unavailable() -> Self {
        Self {
            text: None,
            predicted_label: NO_PREDICTION.to_string(),
            confidence_scores: HashMap::new(),
        }
    }
}

/// Batch classification response; order matches the request's `texts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchClassificationResponse {
    pub predictions: Vec<BatchPrediction>,
}

/// Label → confidence map. A repeated label keeps its last confidence.
fn confidence_map(pairs: &[LabelConfidence]) -> HashMap<String, f32> {
    pairs
        .iter()
        .map(|p| (p.label.clone(), p.confidence))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    /// Round-trips through text so f32 scores compare equal to JSON literals.
    fn to_json<T: Serialize>(value: &T) -> Value {
        serde_json::from_str(&serde_json::to_string(value).unwrap()).unwrap()
    }

    #[test]
    fn test_response_picks_max_confidence() {
        let pairs = vec![
            LabelConfidence::new("x", 0.7),
            LabelConfidence::new("y", 0.3),
        ];
        let response = ClassificationResponse::from_pairs(&pairs).unwrap();
        assert_eq!(response.predicted_label, "x");
        assert_eq!(
            to_json(&response),
            json!({"predicted_label": "x", "confidence_scores": {"x": 0.7, "y": 0.3}})
        );
    }

    #[test]
    fn test_response_uses_max_even_when_not_first() {
        let pairs = vec![
            LabelConfidence::new("sports", 0.1),
            LabelConfidence::new("politics", 0.6),
            LabelConfidence::new("travel", 0.3),
        ];
        let response = ClassificationResponse::from_pairs(&pairs).unwrap();
        assert_eq!(response.predicted_label, "politics");
    }

    #[test]
    fn test_response_tie_goes_to_first() {
        let pairs = vec![
            LabelConfidence::new("a", 0.2),
            LabelConfidence::new("b", 0.4),
            LabelConfidence::new("c", 0.4),
        ];
        let response = ClassificationResponse::from_pairs(&pairs).unwrap();
        assert_eq!(response.predicted_label, "b");
    }

    #[test]
    fn test_response_from_empty_pairs() {
        assert!(ClassificationResponse::from_pairs(&[]).is_none());
    }

    #[test]
    fn test_response_scores_only_contain_returned_labels() {
        let pairs = vec![LabelConfidence::new("kept", 1.0)];
        let response = ClassificationResponse::from_pairs(&pairs).unwrap();
        assert_eq!(response.confidence_scores.len(), 1);
        assert!(response.confidence_scores.contains_key("kept"));
    }

    #[test]
    fn test_batch_prediction_placeholder_shape() {
        let value = to_json(&BatchPrediction::from_pairs("b", &[]));
        assert_eq!(
            value,
            json!({"predicted_label": "No prediction available", "confidence_scores": {}})
        );
    }

    #[test]
    fn test_batch_prediction_carries_text() {
        let pairs = vec![LabelConfidence::new("urgent", 0.9)];
        let value = to_json(&BatchPrediction::from_pairs("server down", &pairs));
        assert_eq!(
            value,
            json!({
                "text": "server down",
                "predicted_label": "urgent",
                "confidence_scores": {"urgent": 0.9}
            })
        );
    }

    #[test]
    fn test_request_rejects_missing_labels() {
        let result: Result<ClassificationRequest, _> =
            serde_json::from_value(json!({"text": "hello"}));
        assert!(result.is_err());
    }
}

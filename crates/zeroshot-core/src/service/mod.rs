//! HTTP service layer.
//!
//! ```text
//! POST /classify        {text, candidate_labels}  -> {predicted_label, confidence_scores}
//! POST /classify_batch  {texts, candidate_labels} -> {predictions: [...]}
//! GET  /health                                    -> {status, backend, model, load_policy}
//! ```
//!
//! `/classify` answers 404 when the adapter has nothing to say, while
//! `/classify_batch` puts a placeholder entry in the list instead.

mod error;

pub use error::{ApiError, ApiJson};

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::inference::LabelPredictor;
use crate::types::{
    BatchClassificationRequest, BatchClassificationResponse, BatchPrediction,
    ClassificationRequest, ClassificationResponse,
};

/// Static facts about the running service, reported by `/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub backend: String,
    pub model: String,
    pub load_policy: String,
}

impl ServiceInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            backend: config.inference.backend.clone(),
            model: config.active_model().to_string(),
            load_policy: config.inference.load_policy.clone(),
        }
    }
}

/// `/health` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(flatten)]
    pub info: ServiceInfo,
}

/// Shared handler state. Cloned per request; holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<dyn LabelPredictor>,
    info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(predictor: Arc<dyn LabelPredictor>, info: ServiceInfo) -> Self {
        Self {
            predictor,
            info: Arc::new(info),
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classify", post(classify))
        .route("/classify_batch", post(classify_batch))
        .route("/health", get(health))
        .with_state(state)
}

async fn classify(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ClassificationRequest>,
) -> Result<Json<ClassificationResponse>, ApiError> {
    tracing::debug!(
        "POST /classify ({} chars, {} labels)",
        request.text.len(),
        request.candidate_labels.len()
    );

    let pairs = state
        .predictor
        .predict(&request.text, &request.candidate_labels)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    ClassificationResponse::from_pairs(&pairs)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn classify_batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BatchClassificationRequest>,
) -> Result<Json<BatchClassificationResponse>, ApiError> {
    tracing::debug!(
        "POST /classify_batch ({} texts, {} labels)",
        request.texts.len(),
        request.candidate_labels.len()
    );

    let mut predictions = Vec::with_capacity(request.texts.len());
    for text in &request.texts {
        let pairs = state
            .predictor
            .predict(text, &request.candidate_labels)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        predictions.push(BatchPrediction::from_pairs(text, &pairs));
    }

    Ok(Json(BatchClassificationResponse { predictions }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        info: state.info.as_ref().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InferenceError, InferenceResult};
    use crate::types::LabelConfidence;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tower::ServiceExt;

    /// Predictor answering from a per-text table; unknown texts get nothing.
    #[derive(Default)]
    struct TablePredictor {
        answers: HashMap<String, Vec<LabelConfidence>>,
        fail: bool,
    }

    impl TablePredictor {
        fn with(mut self, text: &str, pairs: &[(&str, f32)]) -> Self {
            self.answers.insert(
                text.to_string(),
                pairs
                    .iter()
                    .map(|(l, c)| LabelConfidence::new(*l, *c))
                    .collect(),
            );
            self
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl LabelPredictor for TablePredictor {
        async fn predict(
            &self,
            text: &str,
            _candidate_labels: &[String],
        ) -> InferenceResult<Vec<LabelConfidence>> {
            if self.fail {
                return Err(InferenceError::Forward {
                    message: "device lost".to_string(),
                });
            }
            Ok(self.answers.get(text).cloned().unwrap_or_default())
        }
    }

    fn app(predictor: TablePredictor) -> Router {
        let info = ServiceInfo {
            backend: "stub".to_string(),
            model: "stub-model".to_string(),
            load_policy: "shared".to_string(),
        };
        router(AppState::new(Arc::new(predictor), info))
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_classify_returns_max_label_and_scores() {
        let predictor = TablePredictor::default().with("hello", &[("x", 0.7), ("y", 0.3)]);
        let (status, body) = post_json(
            app(predictor),
            "/classify",
            r#"{"text": "hello", "candidate_labels": ["x", "y"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"predicted_label": "x", "confidence_scores": {"x": 0.7, "y": 0.3}})
        );
    }

    #[tokio::test]
    async fn test_classify_tie_picks_first_in_adapter_order() {
        let predictor =
            TablePredictor::default().with("t", &[("low", 0.1), ("b", 0.45), ("a", 0.45)]);
        let (_, body) = post_json(
            app(predictor),
            "/classify",
            r#"{"text": "t", "candidate_labels": ["a", "b", "low"]}"#,
        )
        .await;
        assert_eq!(body["predicted_label"], "b");
    }

    #[tokio::test]
    async fn test_classify_scores_only_returned_labels() {
        let predictor = TablePredictor::default().with("t", &[("kept", 0.9)]);
        let (_, body) = post_json(
            app(predictor),
            "/classify",
            r#"{"text": "t", "candidate_labels": ["kept", "filtered"]}"#,
        )
        .await;
        assert_eq!(body["confidence_scores"], json!({"kept": 0.9}));
    }

    #[tokio::test]
    async fn test_classify_empty_prediction_is_404() {
        let (status, body) = post_json(
            app(TablePredictor::default()),
            "/classify",
            r#"{"text": "unknown", "candidate_labels": []}"#,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "No prediction available"}));
    }

    #[tokio::test]
    async fn test_classify_predictor_error_is_500() {
        let (status, body) = post_json(
            app(TablePredictor::failing()),
            "/classify",
            r#"{"text": "t", "candidate_labels": ["a"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Internal server error: "));
        assert!(detail.contains("device lost"));
    }

    #[tokio::test]
    async fn test_classify_malformed_body_is_500() {
        let (status, body) = post_json(
            app(TablePredictor::default()),
            "/classify",
            r#"{"text": "t"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Internal server error: "));
        assert!(detail.contains("candidate_labels"));
    }

    #[tokio::test]
    async fn test_batch_mixes_predictions_and_placeholders_in_order() {
        let predictor = TablePredictor::default().with("a", &[("pos", 0.8), ("neg", 0.2)]);
        let (status, body) = post_json(
            app(predictor),
            "/classify_batch",
            r#"{"texts": ["a", "b"], "candidate_labels": ["pos", "neg"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(
            predictions[0],
            json!({
                "text": "a",
                "predicted_label": "pos",
                "confidence_scores": {"pos": 0.8, "neg": 0.2}
            })
        );
        assert_eq!(
            predictions[1],
            json!({"predicted_label": "No prediction available", "confidence_scores": {}})
        );
    }

    #[tokio::test]
    async fn test_batch_order_follows_input_when_first_fails() {
        let predictor = TablePredictor::default()
            .with("second", &[("x", 1.0)])
            .with("third", &[("y", 1.0)]);
        let (_, body) = post_json(
            app(predictor),
            "/classify_batch",
            r#"{"texts": ["first", "second", "third"], "candidate_labels": ["x", "y"]}"#,
        )
        .await;

        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions[0]["predicted_label"], "No prediction available");
        assert_eq!(predictions[1]["text"], "second");
        assert_eq!(predictions[2]["text"], "third");
    }

    #[tokio::test]
    async fn test_batch_empty_texts() {
        let (status, body) = post_json(
            app(TablePredictor::default()),
            "/classify_batch",
            r#"{"texts": [], "candidate_labels": ["x"]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"predictions": []}));
    }

    #[tokio::test]
    async fn test_batch_malformed_body_is_500() {
        let (status, body) = post_json(
            app(TablePredictor::default()),
            "/classify_batch",
            r#"{"texts": "not a list", "candidate_labels": []}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Internal server error: "));
    }

    #[tokio::test]
    async fn test_batch_predictor_error_is_500() {
        let (status, _) = post_json(
            app(TablePredictor::failing()),
            "/classify_batch",
            r#"{"texts": ["a"], "candidate_labels": ["x"]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_reports_service_info() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app(TablePredictor::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "status": "ok",
                "backend": "stub",
                "model": "stub-model",
                "load_policy": "shared"
            })
        );
    }

    /// Source whose model can never be loaded.
    struct UnloadableSource;

    #[async_trait]
    impl crate::inference::ClassifierSource for UnloadableSource {
        fn policy(&self) -> &str {
            "per_request"
        }

        async fn acquire(
            &self,
        ) -> InferenceResult<Arc<dyn crate::inference::ZeroShotClassifier>> {
            Err(InferenceError::Model {
                message: "model.onnx not found".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_as_404_and_placeholder() {
        let predictor = crate::inference::Predictor::new(Arc::new(UnloadableSource));
        let info = ServiceInfo {
            backend: "onnx".to_string(),
            model: "missing".to_string(),
            load_policy: predictor.policy().to_string(),
        };
        let app = router(AppState::new(Arc::new(predictor), info));

        let (status, body) = post_json(
            app.clone(),
            "/classify",
            r#"{"text": "t", "candidate_labels": ["a"]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "No prediction available"}));

        let (status, body) = post_json(
            app,
            "/classify_batch",
            r#"{"texts": ["t"], "candidate_labels": ["a"]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"predictions": [
                {"predicted_label": "No prediction available", "confidence_scores": {}}
            ]})
        );
    }
}

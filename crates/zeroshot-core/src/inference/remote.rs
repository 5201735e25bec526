//! Remote zero-shot classifier over a Hugging Face style inference API.
//!
//! Sends the text and candidate labels to `{endpoint}/{model}` and reads back
//! the ranked labels. Authentication is an optional bearer token.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::classifier::{ClassifierOutput, ZeroShotClassifier};
use crate::error::{InferenceError, InferenceResult};

/// Remote classifier for hosted zero-shot pipelines.
pub struct RemoteClassifier {
    url: String,
    model: String,
    api_key: Option<String>,
    hypothesis_template: String,
    multi_label: bool,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteClassifier {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        hypothesis_template: &str,
        multi_label: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            url: format!("{}/{}", endpoint.trim_end_matches('/'), model),
            model: model.to_string(),
            api_key,
            hypothesis_template: hypothesis_template.to_string(),
            multi_label,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

/// Inference API request body.
#[derive(Serialize)]
struct RemoteRequest<'a> {
    inputs: &'a str,
    parameters: RemoteParameters<'a>,
}

#[derive(Serialize)]
struct RemoteParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
    hypothesis_template: &'a str,
}

/// Inference API responses come in two shapes depending on the server.
#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteResponse {
    Ranked { labels: Vec<String>, scores: Vec<f32> },
    Pairs(Vec<RemotePair>),
}

#[derive(Deserialize)]
struct RemotePair {
    label: String,
    score: f32,
}

impl From<RemoteResponse> for ClassifierOutput {
    fn from(response: RemoteResponse) -> Self {
        match response {
            RemoteResponse::Ranked { labels, scores } => Self { labels, scores },
            RemoteResponse::Pairs(pairs) => {
                let (labels, scores) = pairs.into_iter().map(|p| (p.label, p.score)).unzip();
                Self { labels, scores }
            }
        }
    }
}

#[async_trait]
impl ZeroShotClassifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> InferenceResult<ClassifierOutput> {
        let body = RemoteRequest {
            inputs: text,
            parameters: RemoteParameters {
                candidate_labels,
                multi_label: self.multi_label,
                hypothesis_template: &self.hypothesis_template,
            },
        };

        let mut request = self
            .client
            .post(&self.url)
            .json(&body)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(|e| InferenceError::Remote {
            message: format!("Request to {} failed: {e}", self.url),
            status_code: None,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Remote {
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: RemoteResponse = resp.json().await.map_err(|e| InferenceError::Remote {
            message: format!("Failed to parse inference response: {e}"),
            status_code: None,
        })?;

        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/models")
    }

    fn classifier(endpoint: &str, api_key: Option<String>) -> RemoteClassifier {
        RemoteClassifier::new(
            endpoint,
            "org/nli-model",
            api_key,
            "This example is {}.",
            false,
            Duration::from_secs(5),
        )
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_ranked_response() {
        let parsed: RemoteResponse = serde_json::from_value(json!({
            "sequence": "hello",
            "labels": ["greeting", "farewell"],
            "scores": [0.9, 0.1]
        }))
        .unwrap();
        let output = ClassifierOutput::from(parsed);
        assert_eq!(output.labels, vec!["greeting", "farewell"]);
        assert_eq!(output.scores, vec![0.9, 0.1]);
    }

    #[test]
    fn test_parse_pairs_response() {
        let parsed: RemoteResponse = serde_json::from_value(json!([
            {"label": "greeting", "score": 0.9},
            {"label": "farewell", "score": 0.1}
        ]))
        .unwrap();
        let output = ClassifierOutput::from(parsed);
        assert_eq!(output.labels, vec!["greeting", "farewell"]);
    }

    #[test]
    fn test_url_joins_endpoint_and_model() {
        let c = classifier("https://example.test/models/", None);
        assert_eq!(c.url, "https://example.test/models/org/nli-model");
    }

    #[tokio::test]
    async fn test_classify_round_trip() {
        let router = Router::new().route(
            "/models/org/nli-model",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(body["inputs"], "the match ended 2-1");
                assert_eq!(body["parameters"]["multi_label"], false);
                assert_eq!(
                    headers.get("authorization").unwrap(),
                    "Bearer secret-token"
                );
                Json(json!({
                    "labels": body["parameters"]["candidate_labels"],
                    "scores": [0.8, 0.2]
                }))
            }),
        );
        let endpoint = spawn_server(router).await;

        let output = classifier(&endpoint, Some("secret-token".to_string()))
            .classify("the match ended 2-1", &labels(&["sports", "cooking"]))
            .await
            .unwrap();

        assert_eq!(output.labels, vec!["sports", "cooking"]);
        assert_eq!(output.scores, vec![0.8, 0.2]);
    }

    #[tokio::test]
    async fn test_classify_http_error_carries_status() {
        let router = Router::new().route(
            "/models/org/nli-model",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model is loading") }),
        );
        let endpoint = spawn_server(router).await;

        let err = classifier(&endpoint, None)
            .classify("text", &labels(&["a"]))
            .await
            .unwrap_err();

        match err {
            InferenceError::Remote {
                status_code,
                message,
            } => {
                assert_eq!(status_code, Some(503));
                assert!(message.contains("model is loading"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_classify_unreachable_endpoint() {
        // Nothing listens on port 9 of the loopback interface.
        let err = classifier("http://127.0.0.1:9/models", None)
            .classify("text", &labels(&["a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Remote { status_code: None, .. }));
    }
}

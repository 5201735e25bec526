//! How a classifier is obtained for each request.
//!
//! A [`ClassifierLoader`] knows how to build a classifier; a
//! [`ClassifierSource`] decides when to call it. `per_request` loads a fresh
//! classifier for every call, `shared` loads once and reuses the result.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::classifier::{resolve_env_var, ZeroShotClassifier};
use super::nli::{NliClassifier, NliOptions};
use super::remote::RemoteClassifier;
use crate::config::Config;
use crate::error::{InferenceError, InferenceResult};

/// Builds a ready-to-use classifier.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    /// Human-readable description for logging.
    fn describe(&self) -> String;

    async fn load(&self) -> InferenceResult<Arc<dyn ZeroShotClassifier>>;
}

/// Hands out a classifier for each inference call.
#[async_trait]
pub trait ClassifierSource: Send + Sync {
    /// Lifecycle policy name ("shared" or "per_request").
    fn policy(&self) -> &str;

    async fn acquire(&self) -> InferenceResult<Arc<dyn ZeroShotClassifier>>;
}

/// Loads a new classifier on every acquire.
///
/// Concurrent requests load independently with no coordination.
pub struct PerRequestSource {
    loader: Arc<dyn ClassifierLoader>,
}

impl PerRequestSource {
    pub fn new(loader: Arc<dyn ClassifierLoader>) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl ClassifierSource for PerRequestSource {
    fn policy(&self) -> &str {
        "per_request"
    }

    async fn acquire(&self) -> InferenceResult<Arc<dyn ZeroShotClassifier>> {
        tracing::debug!("Loading {}", self.loader.describe());
        self.loader.load().await
    }
}

/// Loads the classifier on first use and reuses it afterwards.
///
/// Callers arriving during the first load wait for it. A failed load is not
/// remembered, so the next acquire tries again.
pub struct SharedSource {
    loader: Arc<dyn ClassifierLoader>,
    cell: OnceCell<Arc<dyn ZeroShotClassifier>>,
}

impl SharedSource {
    pub fn new(loader: Arc<dyn ClassifierLoader>) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    /// Whether a classifier has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

#[async_trait]
impl ClassifierSource for SharedSource {
    fn policy(&self) -> &str {
        "shared"
    }

    async fn acquire(&self) -> InferenceResult<Arc<dyn ZeroShotClassifier>> {
        let classifier = self
            .cell
            .get_or_try_init(|| async {
                tracing::info!("Loading {}", self.loader.describe());
                let classifier = self.loader.load().await?;
                tracing::info!("Classifier loaded ({})", classifier.model());
                Ok::<_, InferenceError>(classifier)
            })
            .await?;
        Ok(Arc::clone(classifier))
    }
}

/// Loads the local ONNX NLI classifier.
pub struct NliLoader {
    model_id: String,
    model_dir: PathBuf,
    options: NliOptions,
}

#[async_trait]
impl ClassifierLoader for NliLoader {
    fn describe(&self) -> String {
        format!("ONNX NLI model {} from {:?}", self.model_id, self.model_dir)
    }

    async fn load(&self) -> InferenceResult<Arc<dyn ZeroShotClassifier>> {
        let model_id = self.model_id.clone();
        let model_dir = self.model_dir.clone();
        let options = self.options.clone();

        // Session creation reads and optimizes the model file.
        let classifier = tokio::task::spawn_blocking(move || {
            NliClassifier::load(&model_id, &model_dir, options)
        })
        .await??;

        Ok(Arc::new(classifier))
    }
}

/// Builds the remote inference API client.
pub struct RemoteLoader {
    endpoint: String,
    model: String,
    api_key: String,
    hypothesis_template: String,
    multi_label: bool,
    timeout: Duration,
}

#[async_trait]
impl ClassifierLoader for RemoteLoader {
    fn describe(&self) -> String {
        format!("remote model {} at {}", self.model, self.endpoint)
    }

    async fn load(&self) -> InferenceResult<Arc<dyn ZeroShotClassifier>> {
        let api_key = resolve_env_var(&self.api_key);
        if api_key.is_none() {
            tracing::debug!("No API token configured for {}", self.endpoint);
        }

        Ok(Arc::new(RemoteClassifier::new(
            &self.endpoint,
            &self.model,
            api_key,
            &self.hypothesis_template,
            self.multi_label,
            self.timeout,
        )))
    }
}

/// Factory that assembles the classifier source described by the config.
pub struct ClassifierFactory;

impl ClassifierFactory {
    /// Create the loader for `config.inference.backend`.
    pub fn loader(config: &Config) -> InferenceResult<Arc<dyn ClassifierLoader>> {
        let inference = &config.inference;
        match inference.backend.as_str() {
            "onnx" => Ok(Arc::new(NliLoader {
                model_id: config.onnx.model.clone(),
                model_dir: config.onnx_model_dir(),
                options: NliOptions {
                    hypothesis_template: inference.hypothesis_template.clone(),
                    multi_label: inference.multi_label,
                    max_length: inference.max_length,
                },
            })),
            "remote" => Ok(Arc::new(RemoteLoader {
                endpoint: config.remote.endpoint.clone(),
                model: config.remote.model.clone(),
                api_key: config.remote.api_key.clone(),
                hypothesis_template: inference.hypothesis_template.clone(),
                multi_label: inference.multi_label,
                timeout: Duration::from_millis(config.remote.timeout_ms),
            })),
            other => Err(InferenceError::Model {
                message: format!("Unknown inference backend: {other}"),
            }),
        }
    }

    /// Wrap `loader` in the lifecycle named by `load_policy`.
    pub fn source(
        load_policy: &str,
        loader: Arc<dyn ClassifierLoader>,
    ) -> InferenceResult<Arc<dyn ClassifierSource>> {
        match load_policy {
            "shared" => Ok(Arc::new(SharedSource::new(loader))),
            "per_request" => Ok(Arc::new(PerRequestSource::new(loader))),
            other => Err(InferenceError::Model {
                message: format!("Unknown load policy: {other}"),
            }),
        }
    }

    /// Build the classifier source for the whole config.
    pub fn create(config: &Config) -> InferenceResult<Arc<dyn ClassifierSource>> {
        let loader = Self::loader(config)?;
        Self::source(&config.inference.load_policy, loader)
    }
}

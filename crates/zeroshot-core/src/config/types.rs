//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.zeroshot/models"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Classifier selection and scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Classifier backend: "onnx" (local) or "remote"
    pub backend: String,

    /// Classifier lifecycle: "shared" (load once) or "per_request"
    pub load_policy: String,

    /// NLI hypothesis built per candidate label; `{}` is replaced by the label
    pub hypothesis_template: String,

    /// Score each label independently instead of normalizing across labels
    pub multi_label: bool,

    /// Maximum token length of a premise/hypothesis pair (local backend)
    pub max_length: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: "onnx".to_string(),
            load_policy: "shared".to_string(),
            hypothesis_template: "This example is {}.".to_string(),
            multi_label: false,
            max_length: 512,
        }
    }
}

/// Local ONNX model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnnxConfig {
    /// Hub identifier of an NLI model with an ONNX export
    pub model: String,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            model: "Xenova/distilbert-base-uncased-mnli".to_string(),
        }
    }
}

/// Remote inference endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL; the model id is appended as the last path segment
    pub endpoint: String,

    /// API token (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://router.huggingface.co/hf-inference/models".to_string(),
            api_key: "${HF_API_TOKEN}".to_string(),
            model: "facebook/bart-large-mnli".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

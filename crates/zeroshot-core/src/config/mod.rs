//! Configuration management for zeroshot.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both produce a usable configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for zeroshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Classifier selection and scoring settings
    pub inference: InferenceConfig,

    /// Local ONNX model settings
    pub onnx: OnnxConfig,

    /// Remote inference endpoint settings
    pub remote: RemoteConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.zeroshot.zeroshot/config.toml
    /// - Linux: ~/.config/zeroshot/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\zeroshot\config\config.toml
    ///
    /// Falls back to ~/.zeroshot/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "zeroshot", "zeroshot")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".zeroshot").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Directory holding the files of the configured ONNX model.
    ///
    /// `Xenova/distilbert-base-uncased-mnli` lands at
    /// `{model_dir}/Xenova--distilbert-base-uncased-mnli`.
    pub fn onnx_model_dir(&self) -> PathBuf {
        self.model_dir().join(model_slug(&self.onnx.model))
    }

    /// Identifier of the model the configured backend serves.
    pub fn active_model(&self) -> &str {
        match self.inference.backend.as_str() {
            "remote" => &self.remote.model,
            _ => &self.onnx.model,
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Turn a hub model id into a single path component.
pub fn model_slug(model: &str) -> String {
    model.replace('/', "--")
}

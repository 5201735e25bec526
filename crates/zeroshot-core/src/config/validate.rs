//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

const BACKENDS: &[&str] = &["onnx", "remote"];
const LOAD_POLICIES: &[&str] = &["shared", "per_request"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be > 0".into(),
            ));
        }
        if !BACKENDS.contains(&self.inference.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "inference.backend must be one of {BACKENDS:?}, got '{}'",
                self.inference.backend
            )));
        }
        if !LOAD_POLICIES.contains(&self.inference.load_policy.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "inference.load_policy must be one of {LOAD_POLICIES:?}, got '{}'",
                self.inference.load_policy
            )));
        }
        if !self.inference.hypothesis_template.contains("{}") {
            return Err(ConfigError::ValidationError(
                "inference.hypothesis_template must contain a '{}' placeholder".into(),
            ));
        }
        if self.inference.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "inference.max_length must be > 0".into(),
            ));
        }
        if self.remote.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "remote.timeout_ms must be > 0".into(),
            ));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of {LOG_FORMATS:?}, got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}

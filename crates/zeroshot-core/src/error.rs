//! Error types for the zeroshot classification service.
//!
//! Errors are split by concern so that the inference adapter can log a
//! precise cause before folding it into an empty result.

use thiserror::Error;

/// Top-level error type for zeroshot operations.
#[derive(Error, Debug)]
pub enum ZeroShotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Classifier loading or inference errors
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while obtaining a classifier or running it.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Model files missing or unloadable
    #[error("Model error: {message}")]
    Model { message: String },

    /// Tokenizer rejected the input
    #[error("Tokenization failed: {message}")]
    Tokenization { message: String },

    /// The forward pass failed or produced unusable output
    #[error("Inference failed: {message}")]
    Forward { message: String },

    /// Remote inference endpoint failure
    #[error("Remote inference error: {message}")]
    Remote {
        message: String,
        status_code: Option<u16>,
    },

    /// A blocking inference task panicked or was cancelled
    #[error("Inference task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience type alias for zeroshot results.
pub type Result<T> = std::result::Result<T, ZeroShotError>;

/// Convenience type alias for inference results.
pub type InferenceResult<T> = std::result::Result<T, InferenceError>;

//! zeroshot core - embeddable zero-shot text classification service.
//!
//! Callers send a text and a set of candidate labels; the service ranks the
//! labels with a pretrained natural-language-inference model and returns the
//! best label plus a confidence per label.
//!
//! # Architecture
//!
//! ```text
//! HTTP (service) → Predictor (adapter) → ClassifierSource (lifecycle)
//!                                      → ZeroShotClassifier (onnx | remote)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zeroshot_core::{service, ClassifierFactory, Config, Predictor};
//!
//! #[tokio::main]
//! async fn main() -> zeroshot_core::Result<()> {
//!     let config = Config::load()?;
//!     let predictor = Predictor::new(ClassifierFactory::create(&config)?);
//!     let state = service::AppState::new(
//!         Arc::new(predictor),
//!         service::ServiceInfo::from_config(&config),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, service::router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod inference;
pub mod math;
pub mod service;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, InferenceError, InferenceResult, Result, ZeroShotError};
pub use inference::{
    ClassifierFactory, ClassifierOutput, ClassifierSource, LabelPredictor, Predictor,
    ZeroShotClassifier,
};
pub use types::{
    BatchClassificationRequest, BatchClassificationResponse, BatchPrediction,
    ClassificationRequest, ClassificationResponse, LabelConfidence, NO_PREDICTION,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Zero-shot inference: classifier backends, their lifecycle, and the
//! adapter the HTTP layer calls.
//!
//! Two backends exist: a local NLI cross-encoder on ONNX Runtime and a
//! remote inference API. Either can be loaded per request or shared.

pub mod adapter;
pub mod classifier;
pub mod lifecycle;
pub mod nli;
pub mod remote;

pub use adapter::{LabelPredictor, Predictor};
pub use classifier::{ClassifierOutput, ZeroShotClassifier};
pub use lifecycle::{ClassifierFactory, ClassifierLoader, ClassifierSource};

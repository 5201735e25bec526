//! Local zero-shot classification with an NLI cross-encoder on ONNX Runtime.
//!
//! Each candidate label becomes a hypothesis ("This example is sports.")
//! paired with the input text as premise. One batched forward pass yields
//! NLI logits per pair; the entailment logits become label scores.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Value;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

use super::classifier::{hypothesis, ClassifierOutput, ZeroShotClassifier};
use crate::error::{InferenceError, InferenceResult};

pub const MODEL_FILENAME: &str = "model.onnx";
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";
pub const CONFIG_FILENAME: &str = "config.json";

/// Scoring options shared by every request.
#[derive(Debug, Clone)]
pub struct NliOptions {
    pub hypothesis_template: String,
    pub multi_label: bool,
    pub max_length: usize,
}

/// Positions of the NLI classes in the model's logits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NliLabels {
    pub entailment: usize,
    pub contradiction: Option<usize>,
}

#[derive(Deserialize)]
struct HfModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

impl NliLabels {
    /// Locate entailment/contradiction from a Hugging Face `config.json`.
    pub fn from_config_json(json: &str) -> InferenceResult<Self> {
        let config: HfModelConfig =
            serde_json::from_str(json).map_err(|e| InferenceError::Model {
                message: format!("Failed to parse model config: {e}"),
            })?;

        let find = |prefix: &str| {
            config.id2label.iter().find_map(|(id, label)| {
                if label.to_lowercase().starts_with(prefix) {
                    id.parse::<usize>().ok()
                } else {
                    None
                }
            })
        };

        let entailment = find("entail").ok_or_else(|| InferenceError::Model {
            message: "Model config id2label has no entailment class; not an NLI model?"
                .to_string(),
        })?;

        Ok(Self {
            entailment,
            contradiction: find("contra"),
        })
    }
}

/// Turn `[num_pairs, num_classes]` NLI logits into one score per label.
///
/// Single-label: softmax of the entailment logits across labels.
/// Multi-label: per label, softmax over (contradiction, entailment).
pub fn score_logits(
    logits: &[f32],
    num_classes: usize,
    labels: NliLabels,
    multi_label: bool,
) -> InferenceResult<Vec<f32>> {
    if num_classes <= labels.entailment {
        return Err(InferenceError::Forward {
            message: format!(
                "Entailment index {} out of range for {num_classes} classes",
                labels.entailment
            ),
        });
    }

    let rows = logits.chunks(num_classes);

    let scores: Vec<f32> = if multi_label {
        let contradiction = labels
            .contradiction
            .filter(|&c| c < num_classes)
            .ok_or_else(|| InferenceError::Forward {
                message: "Multi-label scoring needs a contradiction class".to_string(),
            })?;
        rows.map(|row| crate::math::softmax(&[row[contradiction], row[labels.entailment]])[1])
            .collect()
    } else {
        let entailment: Vec<f32> = rows.map(|row| row[labels.entailment]).collect();
        crate::math::softmax(&entailment)
    };

    // NaN or inf logits (e.g. an overflowing fp16 export) poison every score.
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(InferenceError::Forward {
            message: "NLI model produced non-finite scores".to_string(),
        });
    }

    Ok(scores)
}

/// Pair labels with scores and order them by descending score.
///
/// The sort is stable, so equal scores keep the candidate order. NaN sorts
/// last.
pub fn rank(candidate_labels: &[String], scores: Vec<f32>) -> ClassifierOutput {
    let mut ranked: Vec<(String, f32)> = candidate_labels.iter().cloned().zip(scores).collect();
    ranked.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
        (false, false) => b.1.total_cmp(&a.1),
        (nan_a, nan_b) => nan_a.cmp(&nan_b),
    });

    let (labels, scores) = ranked.into_iter().unzip();
    ClassifierOutput { labels, scores }
}

/// ONNX session, tokenizer and class layout of one NLI model.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
struct NliModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: NliLabels,
    needs_token_type_ids: bool,
}

impl NliModel {
    fn load(model_dir: &Path, max_length: usize) -> InferenceResult<Self> {
        let model_path = model_dir.join(MODEL_FILENAME);
        let tokenizer_path = model_dir.join(TOKENIZER_FILENAME);
        let config_path = model_dir.join(CONFIG_FILENAME);

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                return Err(InferenceError::Model {
                    message: format!(
                        "{path:?} not found. Run `zeroshot models download` first."
                    ),
                });
            }
        }

        let config_json = std::fs::read_to_string(&config_path).map_err(|e| {
            InferenceError::Model {
                message: format!("Failed to read {config_path:?}: {e}"),
            }
        })?;
        let labels = NliLabels::from_config_json(&config_json)?;

        let session = Session::builder()
            .map_err(|e| InferenceError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(&model_path)
            .map_err(|e| InferenceError::Model {
                message: format!("Failed to load NLI model: {e}"),
            })?;

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| InferenceError::Model {
                message: format!("Failed to load tokenizer: {e}"),
            })?;
        // Only the premise is cut so the hypothesis always survives intact.
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                strategy: TruncationStrategy::OnlyFirst,
                ..Default::default()
            }))
            .map_err(|e| InferenceError::Model {
                message: format!("Failed to configure truncation: {e}"),
            })?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let needs_token_type_ids = input_names.iter().any(|n| n == "token_type_ids");

        tracing::debug!(
            "Loaded NLI model from {:?} (inputs: {:?}, entailment: {}, contradiction: {:?})",
            model_path,
            input_names,
            labels.entailment,
            labels.contradiction
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            needs_token_type_ids,
        })
    }

    /// Score every label against `text` in one forward pass.
    fn score(
        &self,
        text: &str,
        candidate_labels: &[String],
        options: &NliOptions,
    ) -> InferenceResult<Vec<f32>> {
        let batch_size = candidate_labels.len();

        let mut encodings = Vec::with_capacity(batch_size);
        for label in candidate_labels {
            let hypothesis = hypothesis(&options.hypothesis_template, label);
            let encoding = self
                .tokenizer
                .encode((text, hypothesis.as_str()), true)
                .map_err(|e| InferenceError::Tokenization {
                    message: e.to_string(),
                })?;
            encodings.push(encoding);
        }

        let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        let pad_id = self
            .tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| self.tokenizer.token_to_id("[PAD]"))
            .or_else(|| self.tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);

        // Flat, right-padded [batch_size, max_len] tensors.
        let mut input_ids = vec![pad_id as i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * max_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &m) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = m as i64;
            }
            for (j, &t) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = t as i64;
            }
        }

        let shape = vec![batch_size as i64, max_len as i64];
        let tensor = |data: Vec<i64>| {
            Value::from_array((shape.clone(), data)).map_err(|e| InferenceError::Forward {
                message: format!("Failed to create input tensor: {e}"),
            })
        };
        let input_ids_value = tensor(input_ids)?;
        let attention_mask_value = tensor(attention_mask)?;

        let mut session = self.session.lock().map_err(|e| InferenceError::Forward {
            message: format!("NLI session lock poisoned: {e}"),
        })?;

        let outputs = if self.needs_token_type_ids {
            let token_type_ids_value = tensor(token_type_ids)?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => attention_mask_value,
                "token_type_ids" => token_type_ids_value
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => attention_mask_value
            ])
        }
        .map_err(|e| InferenceError::Forward {
            message: format!("NLI inference failed: {e}"),
        })?;

        let logits = outputs
            .iter()
            .find(|(name, _)| *name == "logits")
            .ok_or_else(|| InferenceError::Forward {
                message: "NLI model did not produce logits".to_string(),
            })?;

        let (shape, data) =
            logits
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Forward {
                    message: format!("Failed to extract logits: {e}"),
                })?;

        if shape.len() != 2 || shape[0] as usize != batch_size {
            return Err(InferenceError::Forward {
                message: format!("Unexpected logits shape: {:?}", shape),
            });
        }
        let num_classes = shape[1] as usize;

        score_logits(data, num_classes, self.labels, options.multi_label)
    }
}

/// Zero-shot classifier backed by a local NLI model.
pub struct NliClassifier {
    model_id: String,
    model: Arc<NliModel>,
    options: NliOptions,
}

impl NliClassifier {
    /// Load the model files from `model_dir`.
    ///
    /// Expects `model.onnx`, `tokenizer.json` and `config.json`.
    pub fn load(model_id: &str, model_dir: &Path, options: NliOptions) -> InferenceResult<Self> {
        let model = NliModel::load(model_dir, options.max_length)?;
        Ok(Self {
            model_id: model_id.to_string(),
            model: Arc::new(model),
            options,
        })
    }

    /// Check whether all model files exist.
    pub fn model_exists(model_dir: &Path) -> bool {
        Self::model_files(model_dir).iter().all(|p| p.exists())
    }

    /// Paths of the files a model directory must contain.
    pub fn model_files(model_dir: &Path) -> [PathBuf; 3] {
        [
            model_dir.join(MODEL_FILENAME),
            model_dir.join(TOKENIZER_FILENAME),
            model_dir.join(CONFIG_FILENAME),
        ]
    }
}

#[async_trait]
impl ZeroShotClassifier for NliClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn model(&self) -> &str {
        &self.model_id
    }

    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> InferenceResult<ClassifierOutput> {
        if candidate_labels.is_empty() {
            return Ok(ClassifierOutput::default());
        }

        let model = Arc::clone(&self.model);
        let options = self.options.clone();
        let text = text.to_string();
        let labels = candidate_labels.to_vec();

        // Tokenization and the forward pass are CPU-bound.
        let (labels, scores) = tokio::task::spawn_blocking(move || {
            let scores = model.score(&text, &labels, &options);
            (labels, scores)
        })
        .await?;

        Ok(rank(&labels, scores?))
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs a multilingual-e5 style sentence encoder through ONNX Runtime.
//!
//! Features:
//! - Model files resolved from a local directory or pulled through hf-hub
//! - Tokenization with truncation to MAX_SEQUENCE_LENGTH
//! - Batched inference with per-batch padding
//! - Mean pooling over token embeddings (attention-mask weighted)
//! - Optional `token_type_ids` input (XLM-R exports omit it)

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayViewD, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{EngineError, ModelLoader, RetryHint, TextEncoder};
use crate::config::Settings;

/// ONNX-based sentence embedding model
///
/// Produces raw mean-pooled vectors; normalization is left to the engine.
///
/// # Thread Safety
/// `Session::run` needs exclusive access, so inference calls are serialized
/// on the session mutex. Tokenization runs outside the lock.
pub struct OnnxEmbeddingModel {
    /// ONNX Runtime session
    session: Mutex<Session>,

    /// Tokenizer with truncation applied
    tokenizer: Tokenizer,

    /// Model name (e.g., "intfloat/multilingual-e5-large")
    model_name: String,

    /// Output dimension, verified at load time
    dimension: usize,

    /// Tokenizer truncation length
    max_length: usize,

    /// Whether the graph declares a `token_type_ids` input
    uses_token_type_ids: bool,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .finish_non_exhaustive()
    }
}

/// Padded token tensors for one inference call
struct BatchInputs {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
    /// Row-major copy of the mask, kept for pooling
    mask: Vec<i64>,
    seq_len: usize,
}

impl OnnxEmbeddingModel {
    /// Creates a new ONNX embedding model from disk paths
    ///
    /// Blocking: builds the ONNX session and runs one probe inference to
    /// confirm the model emits `expected_dim` wide vectors.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - Model output width differs from `expected_dim`
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "intfloat/multilingual-e5-large",
    ///     "/models/e5/onnx/model.onnx",
    ///     "/models/e5/tokenizer.json",
    ///     1024,
    ///     512,
    /// )?;
    /// ```
    pub fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        expected_dim: usize,
        max_length: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("🚀 Initializing ONNX embedding model {}", model_name);

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");
        debug!(
            "Model inputs: {:?}",
            session.inputs.iter().map(|i| &i.name).collect::<Vec<_>>()
        );

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        tokenizer.with_padding(None);

        let model = Self {
            session: Mutex::new(session),
            tokenizer,
            model_name,
            dimension: expected_dim,
            max_length,
            uses_token_type_ids,
        };

        // Probe inference; the pooled width must match the configured dimension
        let probe = model.run_batch(&["validation test".to_string()])?;
        let width = probe.first().map(Vec::len).unwrap_or(0);
        if width != expected_dim {
            anyhow::bail!(
                "Model outputs {} dimensions (expected {}); check EMBEDDING_DIM",
                width,
                expected_dim
            );
        }

        info!(
            "✅ ONNX embedding model loaded ({} dims, token_type_ids: {})",
            expected_dim, uses_token_type_ids
        );
        Ok(model)
    }

    /// Generates embeddings for multiple texts in one inference call
    ///
    /// Tokenizes all texts, pads to the longest sequence, and mean-pools the
    /// token embeddings of each row.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let embeddings = self.run_batch(texts)?;

        for (i, emb) in embeddings.iter().enumerate() {
            if emb.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    i,
                    emb.len(),
                    self.dimension
                );
            }
        }
        Ok(embeddings)
    }

    fn tokenize(&self, texts: &[String]) -> Result<BatchInputs> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let seq_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(texts.len() * seq_len);
        let mut mask = Vec::with_capacity(texts.len() * seq_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = seq_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(0i64).take(padding));
            mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            mask.extend(std::iter::repeat(0i64).take(padding));
        }

        let shape = (texts.len(), seq_len);
        Ok(BatchInputs {
            input_ids: Array2::from_shape_vec(shape, input_ids)
                .context("Failed to create batch input_ids array")?,
            attention_mask: Array2::from_shape_vec(shape, mask.clone())
                .context("Failed to create batch attention_mask array")?,
            token_type_ids: Array2::zeros(shape),
            mask,
            seq_len,
        })
    }

    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let BatchInputs {
            input_ids,
            attention_mask,
            token_type_ids,
            mask,
            seq_len,
        } = self.tokenize(texts)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;

        let outputs = if self.uses_token_type_ids {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?,
                "token_type_ids" => Value::from_array(token_type_ids)?
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?
            ])?
        };

        // Index [0]: output names differ between exports
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        pool_output(&output, &mask, texts.len(), seq_len)
    }
}

/// Turn the model output into one vector per row
///
/// Token-level output `[batch, seq_len, hidden]` is mean-pooled with the
/// attention mask; sentence-level output `[batch, hidden]` is taken as is.
fn pool_output(
    output: &ArrayViewD<'_, f32>,
    mask: &[i64],
    batch: usize,
    seq_len: usize,
) -> Result<Vec<Vec<f32>>> {
    let shape = output.shape();
    if shape.first() != Some(&batch) {
        anyhow::bail!("Model returned {:?} for a batch of {}", shape, batch);
    }

    let mut embeddings = Vec::with_capacity(batch);
    match shape.len() {
        2 => {
            for row in output.axis_iter(Axis(0)) {
                embeddings.push(row.iter().copied().collect());
            }
        }
        3 => {
            for batch_idx in 0..batch {
                let item = output.index_axis(Axis(0), batch_idx); // [seq_len, hidden]
                let hidden = item.shape()[1];
                let item_mask = &mask[batch_idx * seq_len..(batch_idx + 1) * seq_len];

                let mut pooled = vec![0.0f32; hidden];
                let mut sum_mask = 0.0f32;
                for (i, &m) in item_mask.iter().enumerate().take(item.shape()[0]) {
                    let mask_value = m as f32;
                    sum_mask += mask_value;
                    for (j, slot) in pooled.iter_mut().enumerate() {
                        *slot += item[[i, j]] * mask_value;
                    }
                }
                for val in &mut pooled {
                    *val /= sum_mask.max(1e-9);
                }
                embeddings.push(pooled);
            }
        }
        _ => anyhow::bail!("Unexpected model output shape {:?}", shape),
    }
    Ok(embeddings)
}

impl TextEncoder for OnnxEmbeddingModel {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        self.embed_batch(texts)
            .map_err(|e| EngineError::processing(format!("{:#}", e), RetryHint::Unknown))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Model file locations on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

/// Loads [`OnnxEmbeddingModel`] from EMBEDDING_MODEL
///
/// A directory is used in place; anything else is treated as a Hugging Face
/// repository id and downloaded into MODEL_CACHE_DIR.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxModelLoader;

impl OnnxModelLoader {
    /// Candidate model paths, most specific first
    const MODEL_CANDIDATES: [&'static str; 2] = ["onnx/model.onnx", "model.onnx"];

    pub fn resolve_files(settings: &Settings) -> Result<ModelFiles> {
        if settings.model_is_local() {
            return Self::resolve_local(Path::new(&settings.embedding_model));
        }
        Self::resolve_remote(settings)
    }

    fn resolve_local(dir: &Path) -> Result<ModelFiles> {
        let model = Self::MODEL_CANDIDATES
            .iter()
            .map(|candidate| dir.join(candidate))
            .find(|path| path.exists())
            .with_context(|| format!("No model.onnx found under {}", dir.display()))?;
        let tokenizer = dir.join("tokenizer.json");
        if !tokenizer.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer.display());
        }
        Ok(ModelFiles { model, tokenizer })
    }

    fn resolve_remote(settings: &Settings) -> Result<ModelFiles> {
        info!(
            "📥 Fetching {} into {}",
            settings.embedding_model,
            settings.model_cache_dir.display()
        );
        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_cache_dir(settings.model_cache_dir.clone())
            .with_progress(false)
            .build()
            .context("Failed to initialise Hugging Face client")?;
        let repo = api.model(settings.embedding_model.clone());

        let mut last_error = None;
        let mut model = None;
        for candidate in Self::MODEL_CANDIDATES {
            match repo.get(candidate) {
                Ok(path) => {
                    // Large exports keep weights in a sidecar next to the graph
                    let sidecar = format!("{}_data", candidate);
                    if let Err(e) = repo.get(&sidecar) {
                        debug!("No external data file {}: {}", sidecar, e);
                    }
                    model = Some(path);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }
        let model = match (model, last_error) {
            (Some(path), _) => path,
            (None, Some(e)) => {
                return Err(e).with_context(|| {
                    format!("No ONNX export found in {}", settings.embedding_model)
                })
            }
            (None, None) => anyhow::bail!("No ONNX export found in {}", settings.embedding_model),
        };

        let tokenizer = repo
            .get("tokenizer.json")
            .with_context(|| format!("No tokenizer.json in {}", settings.embedding_model))?;

        Ok(ModelFiles { model, tokenizer })
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, settings: &Settings) -> Result<Arc<dyn TextEncoder>, EngineError> {
        let load_error = |e: anyhow::Error| EngineError::ModelLoad {
            model: settings.embedding_model.clone(),
            reason: format!("{:#}", e),
        };

        let files = Self::resolve_files(settings).map_err(load_error)?;
        debug!("Model files: {:?}", files);

        let model = OnnxEmbeddingModel::new(
            settings.embedding_model.clone(),
            &files.model,
            &files.tokenizer,
            settings.embedding_dim,
            settings.max_sequence_length,
        )
        .map_err(load_error)?;

        Ok(Arc::new(model))
    }
}

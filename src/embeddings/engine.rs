// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding engine
//!
//! Wraps a [`TextEncoder`] with the e5 conventions: documents and queries get
//! different prefixes, inputs are chunked to `max_batch_size`, and every
//! returned vector has unit L2 norm.

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::encoder::{l2_normalize, PASSAGE_PREFIX, QUERY_PREFIX};
use super::{EngineError, ModelLoader, RetryHint, TextEncoder};
use crate::config::Settings;

/// Model metadata reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub embedding_dim: usize,
    pub is_loaded: bool,
}

/// Encodes documents and queries into normalized vectors
///
/// Created empty; becomes ready once an encoder is installed and stays ready
/// for the rest of its life.
pub struct EmbeddingEngine {
    model_name: String,
    dimension: usize,
    max_batch_size: usize,
    encoder: OnceLock<Arc<dyn TextEncoder>>,
}

impl std::fmt::Debug for EmbeddingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingEngine")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_batch_size", &self.max_batch_size)
            .field("is_ready", &self.is_ready())
            .finish()
    }
}

impl EmbeddingEngine {
    pub fn new(settings: &Settings) -> Self {
        Self::with_limits(
            settings.embedding_model.clone(),
            settings.embedding_dim,
            settings.max_batch_size,
        )
    }

    pub fn with_limits(model_name: impl Into<String>, dimension: usize, max_batch_size: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimension,
            max_batch_size: max_batch_size.max(1),
            encoder: OnceLock::new(),
        }
    }

    /// Attach a loaded encoder
    ///
    /// Fails if the encoder's width differs from the configured dimension or
    /// an encoder is already installed.
    pub fn install(&self, encoder: Arc<dyn TextEncoder>) -> Result<(), EngineError> {
        if encoder.dimension() != self.dimension {
            return Err(EngineError::ModelLoad {
                model: self.model_name.clone(),
                reason: format!(
                    "model produces {} dimensions, configured for {}",
                    encoder.dimension(),
                    self.dimension
                ),
            });
        }
        self.encoder.set(encoder).map_err(|_| EngineError::ModelLoad {
            model: self.model_name.clone(),
            reason: "model already loaded".to_string(),
        })
    }

    /// Run `loader` on the blocking pool and install its encoder
    pub async fn load(
        &self,
        loader: Arc<dyn ModelLoader>,
        settings: Arc<Settings>,
    ) -> Result<(), EngineError> {
        let started = Instant::now();
        info!("📦 Loading embedding model {}", self.model_name);

        let encoder = tokio::task::spawn_blocking(move || loader.load(&settings))
            .await
            .map_err(|e| EngineError::ModelLoad {
                model: self.model_name.clone(),
                reason: format!("loader task failed: {}", e),
            })??;
        self.install(encoder)?;

        info!(
            "✅ Embedding model {} ready in {:.1}s ({} dims)",
            self.model_name,
            started.elapsed().as_secs_f64(),
            self.dimension
        );
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.encoder.get().is_some()
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_name: self.model_name.clone(),
            embedding_dim: self.dimension,
            is_loaded: self.is_ready(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Encode documents for indexing
    ///
    /// Output is index-aligned with `texts`.
    pub async fn encode_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        let encoder = self.encoder()?;
        if texts.is_empty() {
            return Err(EngineError::validation("texts", "at least one text is required"));
        }
        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EngineError::validation(
                format!("texts[{}]", i),
                "text must not be blank",
            ));
        }

        let prefixed: Vec<String> = texts
            .iter()
            .map(|t| format!("{}{}", PASSAGE_PREFIX, t))
            .collect();
        let started = Instant::now();
        let vectors = self.run(encoder, prefixed).await?;
        debug!(
            "Encoded {} documents in {}ms",
            vectors.len(),
            started.elapsed().as_millis()
        );
        Ok(vectors)
    }

    /// Encode a search query
    pub async fn encode_query(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let encoder = self.encoder()?;
        if text.trim().is_empty() {
            return Err(EngineError::validation("text", "query must not be blank"));
        }

        let mut vectors = self
            .run(encoder, vec![format!("{}{}", QUERY_PREFIX, text)])
            .await?;
        vectors
            .pop()
            .ok_or_else(|| EngineError::processing("model returned no vector", RetryHint::NotRetryable))
    }

    fn encoder(&self) -> Result<Arc<dyn TextEncoder>, EngineError> {
        self.encoder.get().cloned().ok_or(EngineError::NotReady)
    }

    async fn run(
        &self,
        encoder: Arc<dyn TextEncoder>,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EngineError> {
        let batch = self.max_batch_size;
        let dimension = self.dimension;
        let outcome = tokio::task::spawn_blocking(move || {
            encode_chunked(encoder.as_ref(), &texts, batch, dimension)
        })
        .await
        .map_err(EngineError::from_join)?;

        if let Err(e) = &outcome {
            warn!("Embedding inference failed: {}", e);
        }
        outcome
    }
}

/// Encode in chunks of at most `batch` texts, normalizing each vector
pub(crate) fn encode_chunked(
    encoder: &dyn TextEncoder,
    texts: &[String],
    batch: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>, EngineError> {
    let mut vectors = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(batch.max(1)) {
        let raw = encoder.encode(chunk)?;
        if raw.len() != chunk.len() {
            return Err(EngineError::processing(
                format!("model returned {} vectors for {} texts", raw.len(), chunk.len()),
                RetryHint::NotRetryable,
            ));
        }
        for mut vector in raw {
            if vector.len() != dimension {
                return Err(EngineError::processing(
                    format!("model returned {} dimensions, expected {}", vector.len(), dimension),
                    RetryHint::NotRetryable,
                ));
            }
            l2_normalize(&mut vector)?;
            vectors.push(vector);
        }
    }
    Ok(vectors)
}

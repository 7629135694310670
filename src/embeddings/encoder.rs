// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encoder seam between the engine and a concrete model runtime

use std::sync::Arc;

use super::EngineError;
use crate::config::Settings;

/// Marker prepended to every document before encoding
pub const PASSAGE_PREFIX: &str = "passage: ";

/// Marker prepended to every query before encoding
pub const QUERY_PREFIX: &str = "query: ";

/// A loaded model that maps texts to raw (unnormalized) vectors
///
/// Implementations are blocking; the engine always calls them from the
/// blocking thread pool. Output must be index-aligned with the input.
pub trait TextEncoder: Send + Sync {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError>;

    /// Width of every vector returned by [`encode`](Self::encode)
    fn dimension(&self) -> usize;
}

/// Builds a [`TextEncoder`] for the configured model
///
/// Called at most once per [`EngineAccessor`](super::EngineAccessor), on the
/// blocking pool, so it may download files and take minutes.
pub trait ModelLoader: Send + Sync {
    fn load(&self, settings: &Settings) -> Result<Arc<dyn TextEncoder>, EngineError>;
}

/// Scale `vector` to unit L2 norm in place
pub fn l2_normalize(vector: &mut [f32]) -> Result<(), EngineError> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(EngineError::processing(
            format!("cannot normalize vector with norm {}", norm),
            super::RetryHint::NotRetryable,
        ));
    }
    vector.iter_mut().for_each(|x| *x /= norm);
    Ok(())
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response types for the embedding endpoints

use serde::{Deserialize, Serialize};

/// Response body for POST /api/v1/embed
///
/// # Fields
/// - `embeddings`: One unit-length vector per input text, in input order
/// - `count`: Number of vectors
/// - `model`: Model that produced them
/// - `dim`: Width of every vector
/// - `elapsed_ms`: Wall time spent in the engine
///
/// # Example
/// ```json
/// {
///   "embeddings": [[0.012, -0.034, ...]],
///   "count": 1,
///   "model": "intfloat/multilingual-e5-large",
///   "dim": 1024,
///   "elapsed_ms": 41.7
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedDocumentsResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub count: usize,
    pub model: String,
    pub dim: usize,
    pub elapsed_ms: f64,
}

/// Response body for POST /api/v1/embed/query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedQueryResponse {
    pub embedding: Vec<f32>,
    pub dim: usize,
    pub model: String,
    pub elapsed_ms: f64,
}

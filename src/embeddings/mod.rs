// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding engine, its model runtime, and the process-wide accessor

pub mod accessor;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod onnx_model;

pub use accessor::{EngineAccessor, EngineState};
pub use encoder::{l2_normalize, ModelLoader, TextEncoder, PASSAGE_PREFIX, QUERY_PREFIX};
pub use engine::{EmbeddingEngine, ModelInfo};
pub use error::{EngineError, RetryHint};
pub use onnx_model::{ModelFiles, OnnxEmbeddingModel, OnnxModelLoader};

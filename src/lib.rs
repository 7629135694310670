// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod logging;
pub mod utils;

pub use config::{get_settings, Settings, SettingsError};
pub use embeddings::{EmbeddingEngine, EngineAccessor, EngineError, ModelInfo};
pub use generation::{GenerationClient, GenerationError};

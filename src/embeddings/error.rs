// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error kinds reported by the embedding engine

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Whether repeating a failed operation has a chance of succeeding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryHint {
    /// Transient condition (e.g. the worker task was cancelled)
    Retryable,
    /// Deterministic failure for this input or model
    NotRetryable,
    /// The underlying library did not say
    Unknown,
}

impl fmt::Display for RetryHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryHint::Retryable => f.write_str("retryable"),
            RetryHint::NotRetryable => f.write_str("not_retryable"),
            RetryHint::Unknown => f.write_str("unknown"),
        }
    }
}

/// Failures of [`EmbeddingEngine`](super::EmbeddingEngine) operations
///
/// `Clone` so a single load outcome can be shared with every caller that
/// waited on it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// The model has not finished loading
    #[error("embedding model is not loaded")]
    NotReady,

    /// The model could not be loaded; the engine will never become ready
    #[error("failed to load embedding model {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    /// Caller input rejected before reaching the model
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Inference failed after the model accepted the input
    #[error("embedding failed ({retry}): {message}")]
    Processing { message: String, retry: RetryHint },
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>, retry: RetryHint) -> Self {
        EngineError::Processing {
            message: message.into(),
            retry,
        }
    }

    pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::processing("inference task was cancelled", RetryHint::Retryable)
        } else {
            Self::processing(format!("inference task panicked: {}", err), RetryHint::Unknown)
        }
    }
}

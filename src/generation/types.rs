// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Types for the generation backend protocol

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while calling the generation backend
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Backend answered with a non-success status
    #[error("Generation backend returned {status}: {body}")]
    Backend {
        /// HTTP status code from the backend
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Backend did not answer in time
    #[error("Generation backend timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Connection or protocol failure before a status was received
    #[error("Generation backend unreachable: {0}")]
    Transport(String),

    /// Success status but the body was not `{response: string}`
    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}

/// Body posted to the backend
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackendRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: DecodingOptions,
}

/// Fixed decoding options forwarded with every prompt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DecodingOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// Successful backend body; other fields are ignored
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BackendResponse {
    pub response: String,
}

/// Backend answer paired with the model that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub answer: String,
    pub model: String,
}

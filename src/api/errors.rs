// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

use crate::embeddings::{EngineError, RetryHint};
use crate::generation::GenerationError;

/// Message returned when the embedding model cannot serve requests
pub const MODEL_UNAVAILABLE: &str = "AI model is not available";

/// Message returned for failures whose cause is only logged
pub const INTERNAL_PROCESSING: &str = "Internal processing error";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    ValidationError { field: String, message: String },
    ServiceUnavailable(String),
    BackendError { status: u16, message: String },
    InternalError(String),
    /// Internal failure that carries whether a retry may help
    ProcessingError { message: String, retry: RetryHint },
    Timeout,
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::BackendError { status, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "upstream_status".to_string(),
                    serde_json::Value::Number((*status).into()),
                );
                ("backend_error", message.clone(), Some(details))
            }
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
            ApiError::ProcessingError { message, retry } => {
                let mut details = HashMap::new();
                details.insert(
                    "retry".to_string(),
                    serde_json::Value::String(retry.to_string()),
                );
                ("internal_error", message.clone(), Some(details))
            }
            ApiError::Timeout => ("timeout", "Request timed out".to_string(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::BackendError { .. } => 502,
            ApiError::InternalError(_) | ApiError::ProcessingError { .. } => 500,
            ApiError::Timeout => 504,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::BackendError { status, message } => {
                write!(f, "Backend error ({}): {}", status, message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ProcessingError { message, retry } => {
                write!(f, "Internal error ({}): {}", retry, message)
            }
            ApiError::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotReady => {
                warn!("Embedding request while model is not ready");
                ApiError::ServiceUnavailable(MODEL_UNAVAILABLE.to_string())
            }
            EngineError::ModelLoad { model, reason } => {
                error!("Embedding model {} unavailable: {}", model, reason);
                ApiError::ServiceUnavailable(MODEL_UNAVAILABLE.to_string())
            }
            EngineError::Validation { field, message } => {
                ApiError::ValidationError { field, message }
            }
            EngineError::Processing { message, retry } => {
                error!("Embedding processing failed ({}): {}", retry, message);
                ApiError::ProcessingError {
                    message: INTERNAL_PROCESSING.to_string(),
                    retry,
                }
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Backend { status, body } => {
                error!("Generation backend returned {}: {}", status, body);
                ApiError::BackendError {
                    status,
                    message: format!("Generation backend returned {}", status),
                }
            }
            GenerationError::Timeout { timeout_ms } => {
                error!("Generation backend timed out after {}ms", timeout_ms);
                ApiError::Timeout
            }
            GenerationError::Transport(cause) => {
                error!("Generation backend unreachable: {}", cause);
                ApiError::InternalError(INTERNAL_PROCESSING.to_string())
            }
            GenerationError::MalformedResponse(cause) => {
                error!("Malformed generation backend response: {}", cause);
                ApiError::InternalError(INTERNAL_PROCESSING.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

/// An [`ApiError`] bound to the request it failed
#[derive(Debug)]
pub struct ApiErrorResponse {
    pub error: ApiError,
    pub request_id: String,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<ApiError>, request_id: &str) -> Self {
        Self {
            error: error.into(),
            request_id: request_id.to_string(),
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            request_id: new_request_id(),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.error.to_response(Some(self.request_id));
        (status, Json(body)).into_response()
    }
}

pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

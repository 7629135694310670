// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Liveness and readiness endpoints
//!
//! `/health` only says the process is serving HTTP. `/ready` says whether
//! the embedding model can take requests.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::server::AppState;
use crate::embeddings::EngineState;
use crate::utils::memory::resident_memory_mb;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness report
///
/// # Fields
/// - `status`: "ready", "loading" or "unavailable"
/// - `model_loaded`: Whether encoding requests will be served
/// - `model_name`, `embedding_dim`: Configured model
/// - `uptime_seconds`: Since the HTTP server started
/// - `memory_usage_mb`: Resident memory, if the platform reports it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadyResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_name: String,
    pub embedding_dim: usize,
    pub uptime_seconds: f64,
    pub memory_usage_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /ready
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let (status_code, status, error) = match state.accessor.state() {
        EngineState::Ready => (StatusCode::OK, "ready", None),
        EngineState::NotStarted | EngineState::Loading => {
            (StatusCode::SERVICE_UNAVAILABLE, "loading", None)
        }
        EngineState::Failed(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
            Some(crate::api::errors::MODEL_UNAVAILABLE.to_string()),
        ),
    };

    let body = ReadyResponse {
        status: status.to_string(),
        model_loaded: status_code == StatusCode::OK,
        model_name: state.settings.embedding_model.clone(),
        embedding_dim: state.settings.embedding_dim,
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        memory_usage_mb: resident_memory_mb(),
        error,
    };

    (status_code, Json(body)).into_response()
}

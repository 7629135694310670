// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/v1/generate HTTP handler

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::time::Instant;
use tracing::{debug, info};

use crate::api::errors::{new_request_id, ApiError, ApiErrorResponse};
use crate::api::generate::{GenerateRequest, GenerateResponse};
use crate::api::server::AppState;
use crate::generation::build_rag_prompt;

/// POST /api/v1/generate handler
///
/// Builds a prompt from the caller's passages and relays it to the
/// generation backend. Bounded by the backend timeout plus the request
/// timeout.
pub async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiErrorResponse> {
    let request_id = new_request_id();
    let Json(request) = payload.map_err(|e| ApiErrorResponse::new(e, &request_id))?;
    request
        .validate()
        .map_err(|e| ApiErrorResponse::new(e, &request_id))?;

    let ceiling = state.settings.generation.num_predict;
    if request.max_tokens != i64::from(ceiling) {
        debug!(
            request_id = %request_id,
            "max_tokens {} requested; backend ceiling stays at {}",
            request.max_tokens,
            ceiling
        );
    }

    let prompt = build_rag_prompt(&request.query, &request.context);
    let limit = state
        .settings
        .generation
        .timeout
        .saturating_add(state.settings.request_timeout);

    let started = Instant::now();
    let generation = tokio::time::timeout(limit, state.generator.generate(&prompt))
        .await
        .map_err(|_| ApiErrorResponse::new(ApiError::Timeout, &request_id))?
        .map_err(|e| ApiErrorResponse::new(e, &request_id))?;

    info!(
        request_id = %request_id,
        "💬 Generated answer with {} in {}ms ({} passages)",
        generation.model,
        started.elapsed().as_millis(),
        request.context.len()
    );

    Ok(Json(GenerateResponse {
        answer: generation.answer,
        model: generation.model,
    }))
}

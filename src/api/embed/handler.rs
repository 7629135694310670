// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding endpoint handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::time::Instant;
use tracing::info;

use crate::api::embed::{
    EmbedDocumentsRequest, EmbedDocumentsResponse, EmbedQueryRequest, EmbedQueryResponse,
};
use crate::api::errors::{new_request_id, ApiError, ApiErrorResponse};
use crate::api::server::AppState;

/// POST /api/v1/embed handler
///
/// Encodes documents for indexing. Input is validated before the engine is
/// touched; the engine is loaded on first use if the background preload has
/// not finished.
pub async fn embed_documents_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbedDocumentsRequest>, JsonRejection>,
) -> Result<Json<EmbedDocumentsResponse>, ApiErrorResponse> {
    let request_id = new_request_id();
    let Json(request) = payload.map_err(|e| ApiErrorResponse::new(e, &request_id))?;
    request
        .validate()
        .map_err(|e| ApiErrorResponse::new(e, &request_id))?;

    let started = Instant::now();
    let (engine, embeddings) = state
        .within_embedding_deadline(async {
            let engine = state.accessor.get().await?;
            let embeddings = engine.encode_documents(&request.texts).await?;
            Ok::<_, ApiError>((engine, embeddings))
        })
        .await
        .map_err(|e| ApiErrorResponse::new(e, &request_id))?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    info!(
        request_id = %request_id,
        count = embeddings.len(),
        "📚 Embedded {} documents in {:.1}ms",
        embeddings.len(),
        elapsed_ms
    );

    Ok(Json(EmbedDocumentsResponse {
        count: embeddings.len(),
        embeddings,
        model: engine.model_name().to_string(),
        dim: engine.dimension(),
        elapsed_ms,
    }))
}

/// POST /api/v1/embed/query handler
pub async fn embed_query_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbedQueryRequest>, JsonRejection>,
) -> Result<Json<EmbedQueryResponse>, ApiErrorResponse> {
    let request_id = new_request_id();
    let Json(request) = payload.map_err(|e| ApiErrorResponse::new(e, &request_id))?;
    request
        .validate()
        .map_err(|e| ApiErrorResponse::new(e, &request_id))?;

    let started = Instant::now();
    let (engine, embedding) = state
        .within_embedding_deadline(async {
            let engine = state.accessor.get().await?;
            let embedding = engine.encode_query(&request.text).await?;
            Ok::<_, ApiError>((engine, embedding))
        })
        .await
        .map_err(|e| ApiErrorResponse::new(e, &request_id))?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    info!(request_id = %request_id, "🔎 Embedded query in {:.1}ms", elapsed_ms);

    Ok(Json(EmbedQueryResponse {
        dim: embedding.len(),
        embedding,
        model: engine.model_name().to_string(),
        elapsed_ms,
    }))
}

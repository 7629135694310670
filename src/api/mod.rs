// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod embed;
pub mod errors;
pub mod generate;
pub mod health;
pub mod server;

pub use embed::{
    embed_documents_handler, embed_query_handler, EmbedDocumentsRequest, EmbedDocumentsResponse,
    EmbedQueryRequest, EmbedQueryResponse,
};
pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use generate::{generate_handler, GenerateRequest, GenerateResponse};
pub use health::{HealthResponse, ReadyResponse};
pub use server::{create_router, shutdown_signal, AppState, ApiServer};

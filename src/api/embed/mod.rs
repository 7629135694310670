// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! POST /api/v1/embed (documents) and POST /api/v1/embed/query (queries).

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{embed_documents_handler, embed_query_handler};
pub use request::{EmbedDocumentsRequest, EmbedQueryRequest, MAX_TEXTS_PER_REQUEST, MAX_TEXT_CHARS};
pub use response::{EmbedDocumentsResponse, EmbedQueryResponse};

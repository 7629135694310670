// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/v1/embed/query tests

use crate::common::{as_vector, l2_norm, FakeLoader, TestApp, TEST_DIM, TEST_MODEL};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_query_embedding() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (status, body) = app
        .post_json("/api/v1/embed/query", json!({ "text": "capital of Japan" }))
        .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["dim"], TEST_DIM);
    assert_eq!(body["model"], TEST_MODEL);
    let vector = as_vector(&body["embedding"]);
    assert_eq!(vector.len(), TEST_DIM);
    assert!((l2_norm(&vector) - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_empty_query_rejected_before_engine() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (status, body) = app.post_json("/api/v1/embed/query", json!({ "text": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "text");
    assert_eq!(app.loader.load_count(), 0);
}

#[tokio::test]
async fn test_query_differs_from_document() {
    let app = TestApp::new(FakeLoader::default(), &[]);
    let text = "Mount Fuji is the highest mountain in Japan";

    let (_, query) = app.post_json("/api/v1/embed/query", json!({ "text": text })).await;
    let (_, docs) = app.post_json("/api/v1/embed", json!({ "texts": [text] })).await;

    assert_ne!(
        as_vector(&query["embedding"]),
        as_vector(&docs["embeddings"][0])
    );
}

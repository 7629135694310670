// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Error path tests for the HTTP surface
//!
//! - Every error is a JSON body with error_type/message/request_id
//! - Model failures are 503, never 500
//! - Internal causes are not leaked

use crate::common::{FakeLoader, TestApp};
use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_malformed_json_is_json_400() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (status, body) = app.post_raw("/api/v1/embed", "{not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_request");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_missing_field_is_json_400() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (status, body) = app
        .post_json("/api/v1/embed/query", json!({ "query": "wrong field" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_load_failure_is_sticky_503() {
    let app = TestApp::new(FakeLoader::failing("/secret/path/model.onnx missing"), &[]);

    for _ in 0..3 {
        let (status, body) = app
            .post_json("/api/v1/embed", json!({ "texts": ["hello"] }))
            .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error_type"], "service_unavailable");
        assert_eq!(body["message"], "AI model is not available");
        assert!(!body.to_string().contains("/secret/path"));
    }

    assert_eq!(app.loader.load_count(), 1);
}

#[tokio::test]
async fn test_deadline_while_loading_is_503() {
    let app = TestApp::new(
        FakeLoader::slow(Duration::from_secs(3)),
        &[("REQUEST_TIMEOUT", "1")],
    );

    let (status, body) = app
        .post_json("/api/v1/embed/query", json!({ "text": "hello" }))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_type"], "service_unavailable");

    // The abandoned request did not cancel the load
    let engine = app.accessor.get().await.unwrap();
    assert!(engine.is_ready());
    assert_eq!(app.loader.load_count(), 1);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (status, body) = app.get("/api/v1/nothing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (_, first) = app.post_json("/api/v1/embed", json!({ "texts": [] })).await;
    let (_, second) = app.post_json("/api/v1/embed", json!({ "texts": [] })).await;

    assert_ne!(first["request_id"], second["request_id"]);
}

#[tokio::test]
async fn test_slow_inference_on_ready_engine_is_504() {
    let app = TestApp::new(
        FakeLoader::slow_encoder(Duration::from_secs(2)),
        &[("REQUEST_TIMEOUT", "1")],
    );
    app.accessor.get().await.unwrap();

    let (status, body) = app
        .post_json("/api/v1/embed", json!({ "texts": ["slow"] }))
        .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error_type"], "timeout");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_processing_failure_reports_retry_hint() {
    let app = TestApp::new(FakeLoader::zero_vectors(), &[]);

    let (status, body) = app
        .post_json("/api/v1/embed/query", json!({ "text": "nothing to see" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "internal_error");
    assert_eq!(body["message"], "Internal processing error");
    assert_eq!(body["details"]["retry"], "not_retryable");
}

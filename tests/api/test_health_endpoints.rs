// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Liveness and readiness tests

use crate::common::{FakeLoader, TestApp, TEST_DIM, TEST_MODEL};
use axum::http::StatusCode;

#[tokio::test]
async fn test_health_ok_before_model_loads() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
    assert_eq!(app.loader.load_count(), 0);
}

#[tokio::test]
async fn test_ready_reports_loading_then_ready() {
    let app = TestApp::new(FakeLoader::default(), &[]);

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "loading");
    assert_eq!(body["model_loaded"], false);

    app.accessor.get().await.unwrap();

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_name"], TEST_MODEL);
    assert_eq!(body["embedding_dim"], TEST_DIM);
    assert!(body["uptime_seconds"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_ready_reports_unavailable_after_failure() {
    let app = TestApp::new(FakeLoader::failing("weights missing"), &[]);
    assert!(app.accessor.get().await.is_err());

    let (status, body) = app.get("/ready").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["model_loaded"], false);
    assert!(!body.to_string().contains("weights missing"));
}

#[tokio::test]
async fn test_health_routes_disabled() {
    let app = TestApp::new(FakeLoader::default(), &[("ENABLE_HEALTH_CHECK", "false")]);

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");

    let (status, _) = app.get("/ready").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

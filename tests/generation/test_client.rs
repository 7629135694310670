// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GenerationClient tests against a local stub backend

use crate::common::spawn_backend;
use axum::http::StatusCode;
use nexus_ai_worker::config::GenerationSettings;
use nexus_ai_worker::generation::{GenerationBackend, GenerationClient, GenerationError};
use serde_json::json;
use std::time::Duration;

fn client(url: &str, timeout: Duration) -> GenerationClient {
    GenerationClient::new(&GenerationSettings {
        url: url.to_string(),
        model: "qwen2.5:7b".to_string(),
        timeout,
        temperature: 0.7,
        num_predict: 200,
    })
    .unwrap()
}

#[tokio::test]
async fn test_success_returns_answer_and_model() {
    let (url, captured) =
        spawn_backend(StatusCode::OK, json!({ "response": "42" }), Duration::ZERO).await;

    let generation = client(&url, Duration::from_secs(5))
        .generate("the prompt")
        .await
        .unwrap();

    assert_eq!(generation.answer, "42");
    assert_eq!(generation.model, "qwen2.5:7b");

    let sent = captured.lock().unwrap();
    assert_eq!(sent[0]["model"], "qwen2.5:7b");
    assert_eq!(sent[0]["prompt"], "the prompt");
    assert_eq!(sent[0]["stream"], false);
    assert_eq!(sent[0]["options"]["num_predict"], 200);
    let temperature = sent[0]["options"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn test_non_success_status_is_backend_error() {
    let (url, _) = spawn_backend(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "out of memory" }),
        Duration::ZERO,
    )
    .await;

    let err = client(&url, Duration::from_secs(5))
        .generate("p")
        .await
        .unwrap_err();

    match err {
        GenerationError::Backend { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("out of memory"));
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_response_field_is_malformed() {
    let (url, _) = spawn_backend(StatusCode::OK, json!({ "done": true }), Duration::ZERO).await;

    let err = client(&url, Duration::from_secs(5))
        .generate("p")
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let (url, _) = spawn_backend(
        StatusCode::OK,
        json!({ "response": "late" }),
        Duration::from_secs(3),
    )
    .await;

    let err = client(&url, Duration::from_millis(500))
        .generate("p")
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Timeout { timeout_ms: 500 }));
}

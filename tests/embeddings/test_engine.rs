// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbeddingEngine tests over a deterministic encoder

use crate::common::{l2_norm, HashEncoder, TEST_BATCH, TEST_DIM};
use nexus_ai_worker::embeddings::{
    EmbeddingEngine, EngineError, RetryHint, TextEncoder, PASSAGE_PREFIX, QUERY_PREFIX,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn ready_engine() -> (EmbeddingEngine, Arc<HashEncoder>) {
    let engine = EmbeddingEngine::with_limits("test-model", TEST_DIM, TEST_BATCH);
    let encoder = Arc::new(HashEncoder::new(TEST_DIM));
    engine.install(encoder.clone()).unwrap();
    (engine, encoder)
}

fn texts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("passage text {}", i)).collect()
}

#[tokio::test]
async fn test_every_vector_has_dimension_and_unit_norm() {
    let (engine, _) = ready_engine();

    let vectors = engine.encode_documents(&texts(TEST_BATCH)).await.unwrap();

    assert_eq!(vectors.len(), TEST_BATCH);
    for vector in &vectors {
        assert_eq!(vector.len(), TEST_DIM);
        assert!((l2_norm(vector) - 1.0).abs() < 1e-5);
    }
}

#[tokio::test]
async fn test_chunks_by_max_batch_size_preserving_order() {
    let (engine, encoder) = ready_engine();
    let input = texts(TEST_BATCH * 2 + 1);

    let vectors = engine.encode_documents(&input).await.unwrap();

    assert_eq!(vectors.len(), input.len());
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 3);

    // Each output matches encoding its own text alone
    for (text, vector) in input.iter().zip(&vectors) {
        let single = engine.encode_documents(&[text.clone()]).await.unwrap();
        assert_eq!(&single[0], vector);
    }
}

#[tokio::test]
async fn test_prefixes_applied() {
    let (engine, encoder) = ready_engine();

    engine.encode_documents(&["tea".to_string()]).await.unwrap();
    engine.encode_query("tea").await.unwrap();

    let seen = encoder.seen.lock().unwrap();
    assert_eq!(seen[0], format!("{}tea", PASSAGE_PREFIX));
    assert_eq!(seen[1], format!("{}tea", QUERY_PREFIX));
}

#[tokio::test]
async fn test_document_and_query_vectors_differ() {
    let (engine, _) = ready_engine();

    let document = engine
        .encode_documents(&["green tea".to_string()])
        .await
        .unwrap();
    let query = engine.encode_query("green tea").await.unwrap();

    assert_ne!(document[0], query);
}

#[tokio::test]
async fn test_not_ready_is_distinct_error() {
    let engine = EmbeddingEngine::with_limits("test-model", TEST_DIM, TEST_BATCH);

    assert_eq!(
        engine.encode_documents(&texts(1)).await.unwrap_err(),
        EngineError::NotReady
    );
    assert_eq!(
        engine.encode_query("q").await.unwrap_err(),
        EngineError::NotReady
    );
}

#[tokio::test]
async fn test_empty_and_blank_input_are_validation_failures() {
    let (engine, encoder) = ready_engine();

    assert!(matches!(
        engine.encode_documents(&[]).await,
        Err(EngineError::Validation { .. })
    ));
    assert!(matches!(
        engine.encode_documents(&["ok".to_string(), " ".to_string()]).await,
        Err(EngineError::Validation { field, .. }) if field == "texts[1]"
    ));
    assert!(matches!(
        engine.encode_query("\t").await,
        Err(EngineError::Validation { .. })
    ));
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
}

struct ZeroEncoder;

impl TextEncoder for ZeroEncoder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(vec![vec![0.0; TEST_DIM]; texts.len()])
    }

    fn dimension(&self) -> usize {
        TEST_DIM
    }
}

#[tokio::test]
async fn test_zero_vector_is_processing_error() {
    let engine = EmbeddingEngine::with_limits("zero", TEST_DIM, TEST_BATCH);
    engine.install(Arc::new(ZeroEncoder)).unwrap();

    let err = engine.encode_query("anything").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Processing {
            retry: RetryHint::NotRetryable,
            ..
        }
    ));
}

struct PanickingEncoder;

impl TextEncoder for PanickingEncoder {
    fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        panic!("runtime crashed");
    }

    fn dimension(&self) -> usize {
        TEST_DIM
    }
}

#[tokio::test]
async fn test_encoder_panic_is_processing_error() {
    let engine = EmbeddingEngine::with_limits("panics", TEST_DIM, TEST_BATCH);
    engine.install(Arc::new(PanickingEncoder)).unwrap();

    assert!(matches!(
        engine.encode_query("q").await,
        Err(EngineError::Processing { .. })
    ));
}

#[test]
fn test_model_info() {
    let (engine, _) = ready_engine();
    let info = engine.model_info();

    assert_eq!(info.model_name, "test-model");
    assert_eq!(info.embedding_dim, TEST_DIM);
    assert!(info.is_loaded);
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX model tests against real model files
//!
//! Point E5_MODEL_DIR at a directory holding `onnx/model.onnx` (or
//! `model.onnx`) and `tokenizer.json` for intfloat/multilingual-e5-large,
//! then run with `--ignored`.

use nexus_ai_worker::embeddings::{
    EmbeddingEngine, ModelLoader, OnnxEmbeddingModel, OnnxModelLoader, TextEncoder,
};
use nexus_ai_worker::Settings;
use std::sync::Arc;

const E5_DIM: usize = 1024;

fn model_dir() -> String {
    std::env::var("E5_MODEL_DIR").unwrap_or_else(|_| "./models/multilingual-e5-large".to_string())
}

fn settings(cache: &tempfile::TempDir) -> Settings {
    Settings::from_vars([
        ("EMBEDDING_MODEL", model_dir()),
        ("MODEL_CACHE_DIR", cache.path().to_string_lossy().into_owned()),
    ])
    .unwrap()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
#[ignore] // Only run if model files are downloaded
fn test_loader_builds_encoder_with_configured_dimension() {
    let cache = tempfile::tempdir().unwrap();
    let encoder = OnnxModelLoader.load(&settings(&cache)).unwrap();
    assert_eq!(encoder.dimension(), E5_DIM);
}

#[test]
#[ignore] // Only run if model files are downloaded
fn test_dimension_mismatch_fails_load() {
    let cache = tempfile::tempdir().unwrap();
    let mut settings = settings(&cache);
    settings.embedding_dim = 384;

    assert!(OnnxModelLoader.load(&settings).is_err());
}

#[test]
#[ignore] // Only run if model files are downloaded
fn test_batch_padding_does_not_change_vectors() {
    let cache = tempfile::tempdir().unwrap();
    let settings = settings(&cache);
    let files = OnnxModelLoader::resolve_files(&settings).unwrap();
    let model =
        OnnxEmbeddingModel::new("e5", &files.model, &files.tokenizer, E5_DIM, 512).unwrap();

    let short = "passage: short".to_string();
    let long = "passage: a considerably longer passage that forces padding".to_string();

    let alone = model.embed_batch(&[short.clone()]).unwrap();
    let padded = model.embed_batch(&[short, long]).unwrap();

    for (a, b) in alone[0].iter().zip(&padded[0]) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_related_texts_score_higher() {
    let cache = tempfile::tempdir().unwrap();
    let settings = settings(&cache);
    let engine = EmbeddingEngine::new(&settings);
    engine
        .load(Arc::new(OnnxModelLoader), Arc::new(settings))
        .await
        .unwrap();

    let docs = engine
        .encode_documents(&[
            "東京は日本の首都です。".to_string(),
            "Bananas are rich in potassium.".to_string(),
        ])
        .await
        .unwrap();
    let query = engine.encode_query("What is the capital of Japan?").await.unwrap();

    assert!(cosine(&query, &docs[0]) > cosine(&query, &docs[1]));
}

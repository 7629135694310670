// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Engine accessor
//!
//! Hands out the single [`EmbeddingEngine`] of the process. The first call to
//! [`EngineAccessor::get`] starts the load on a detached task; every caller,
//! concurrent or later, awaits that same load and receives the same outcome.
//! A failed load is remembered and returned to every subsequent caller.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{error, info, warn};

use super::{EmbeddingEngine, EngineError, ModelLoader, OnnxModelLoader};
use crate::config::Settings;
use crate::utils::memory::{memory_warning, resident_memory_mb};

type LoadOutcome = Result<Arc<EmbeddingEngine>, EngineError>;
type LoadFuture = Shared<BoxFuture<'static, LoadOutcome>>;

/// Lifecycle of the engine as seen from outside
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    /// Nobody has asked for the engine yet
    NotStarted,
    Loading,
    Ready,
    /// Load failed; the message is the load error
    Failed(String),
}

/// Lazily loads and memoizes the embedding engine
pub struct EngineAccessor {
    settings: Arc<Settings>,
    loader: Arc<dyn ModelLoader>,
    load: Mutex<Option<LoadFuture>>,
    outcome: Arc<OnceLock<LoadOutcome>>,
}

impl std::fmt::Debug for EngineAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineAccessor")
            .field("model", &self.settings.embedding_model)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<Arc<EngineAccessor>> = OnceLock::new();

impl EngineAccessor {
    pub fn new(settings: Arc<Settings>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            settings,
            loader,
            load: Mutex::new(None),
            outcome: Arc::new(OnceLock::new()),
        }
    }

    /// Process-wide accessor backed by the ONNX loader
    ///
    /// `settings` is only used by the first call.
    pub fn global(settings: Arc<Settings>) -> Arc<EngineAccessor> {
        GLOBAL
            .get_or_init(|| Arc::new(EngineAccessor::new(settings, Arc::new(OnnxModelLoader))))
            .clone()
    }

    /// The engine, loading it on first use
    ///
    /// Must be called from within a Tokio runtime. Dropping the returned
    /// future does not cancel the load.
    pub async fn get(&self) -> Result<Arc<EmbeddingEngine>, EngineError> {
        self.load_future().await
    }

    /// The engine if it has already loaded, without waiting
    pub fn try_get(&self) -> Result<Arc<EmbeddingEngine>, EngineError> {
        match self.outcome.get() {
            Some(outcome) => outcome.clone(),
            None => Err(EngineError::NotReady),
        }
    }

    /// Whether [`get`](Self::get) has been called at least once
    pub fn is_initialized(&self) -> bool {
        self.slot().is_some()
    }

    pub fn state(&self) -> EngineState {
        match self.outcome.get() {
            Some(Ok(_)) => EngineState::Ready,
            Some(Err(e)) => EngineState::Failed(e.to_string()),
            None if self.is_initialized() => EngineState::Loading,
            None => EngineState::NotStarted,
        }
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<LoadFuture>> {
        self.load.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_future(&self) -> LoadFuture {
        let mut slot = self.slot();
        slot.get_or_insert_with(|| {
            let settings = self.settings.clone();
            let loader = self.loader.clone();
            let outcome = self.outcome.clone();
            let model = settings.embedding_model.clone();

            let task = tokio::spawn(async move {
                let result = construct(settings, loader).await;
                let _ = outcome.set(result.clone());
                result
            });

            async move {
                task.await.unwrap_or_else(|e| {
                    Err(EngineError::ModelLoad {
                        model,
                        reason: format!("load task failed: {}", e),
                    })
                })
            }
            .boxed()
            .shared()
        })
        .clone()
    }
}

async fn construct(settings: Arc<Settings>, loader: Arc<dyn ModelLoader>) -> LoadOutcome {
    let engine = EmbeddingEngine::new(&settings);
    let timeout = settings.model_load_timeout;

    let loaded = tokio::time::timeout(timeout, engine.load(loader, settings.clone())).await;
    match loaded {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("❌ Embedding model load failed: {}", e);
            return Err(e);
        }
        Err(_) => {
            let e = EngineError::ModelLoad {
                model: settings.embedding_model.clone(),
                reason: format!("load did not finish within {}s", timeout.as_secs()),
            };
            error!("❌ {}", e);
            return Err(e);
        }
    }

    if let Some(resident) = resident_memory_mb() {
        info!("Resident memory after model load: {:.0}MB", resident);
        if let Some(warning) = settings
            .max_memory_gb
            .and_then(|limit| memory_warning(resident, limit))
        {
            warn!("⚠️  {}", warning);
        }
    }

    Ok(Arc::new(engine))
}

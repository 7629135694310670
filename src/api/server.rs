// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server: shared state, router, and serve loop

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::embed::{embed_documents_handler, embed_query_handler};
use super::errors::{ApiError, ApiErrorResponse, MODEL_UNAVAILABLE};
use super::generate::generate_handler;
use super::health::{health_handler, ready_handler};
use crate::config::Settings;
use crate::embeddings::{EngineAccessor, EngineState};
use crate::generation::GenerationBackend;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub accessor: Arc<EngineAccessor>,
    pub generator: Arc<dyn GenerationBackend>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        accessor: Arc<EngineAccessor>,
        generator: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            settings,
            accessor,
            generator,
            started_at: Instant::now(),
        }
    }

    /// Run an embedding operation under REQUEST_TIMEOUT
    ///
    /// A deadline that expires while the model is still loading is reported
    /// as unavailable rather than as a timeout.
    pub async fn within_embedding_deadline<T, F>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        self.within(self.settings.request_timeout, operation).await
    }

    async fn within<T, F>(&self, limit: Duration, operation: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match tokio::time::timeout(limit, operation).await {
            Ok(result) => result,
            Err(_) => match self.accessor.state() {
                EngineState::NotStarted | EngineState::Loading => {
                    warn!("Request deadline passed while model is loading");
                    Err(ApiError::ServiceUnavailable(MODEL_UNAVAILABLE.to_string()))
                }
                _ => {
                    warn!("Request exceeded {}s deadline", limit.as_secs());
                    Err(ApiError::Timeout)
                }
            },
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/api/v1/embed", post(embed_documents_handler))
        .route("/api/v1/embed/query", post(embed_query_handler))
        .route("/api/v1/generate", post(generate_handler));

    if state.settings.enable_health_check {
        router = router
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler));
    }

    router
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found_handler(uri: axum::http::Uri) -> ApiErrorResponse {
    ApiError::NotFound(format!("No route for {}", uri.path())).into()
}

/// Bound HTTP listener plus the router it will serve
pub struct ApiServer {
    listener: TcpListener,
    router: Router,
}

impl ApiServer {
    pub async fn bind(state: AppState, addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            router: create_router(state),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("🌐 API server listening on {}", self.local_addr()?);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

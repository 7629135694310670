// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use nexus_ai_worker::{
    api::{shutdown_signal, ApiServer, AppState},
    cli::{render_settings, Cli, Commands},
    config::{get_settings, Settings},
    embeddings::EngineAccessor,
    generation::GenerationClient,
    logging::init_logging,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let settings = get_settings().context("Invalid configuration")?;

    match cli.command() {
        Commands::ShowConfig => {
            println!("{}", render_settings(&settings));
            Ok(())
        }
        Commands::Serve(args) => {
            let settings = args.apply(settings);
            init_logging(&settings)?;

            if let Some(warning) = settings.worker_warning() {
                warn!("⚠️  {}", warning);
            }

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(settings.num_workers)
                .enable_all()
                .build()
                .context("Failed to build Tokio runtime")?;
            runtime.block_on(serve(settings))
        }
    }
}

async fn serve(settings: Arc<Settings>) -> Result<()> {
    info!("🚀 Starting Nexus AI worker v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "🧠 Embedding model: {} ({} dims, batch {})",
        settings.embedding_model, settings.embedding_dim, settings.max_batch_size
    );
    info!(
        "💬 Generation backend: {} ({})",
        settings.generation.url, settings.generation.model
    );

    let accessor = EngineAccessor::global(settings.clone());
    let generator = Arc::new(
        GenerationClient::new(&settings.generation).context("Failed to create generation client")?,
    );

    // Load in the background so /health answers while the model downloads
    let preload = accessor.clone();
    tokio::spawn(async move {
        if let Err(e) = preload.get().await {
            error!("❌ Embedding model unavailable: {}", e);
        }
    });

    let state = AppState::new(settings.clone(), accessor, generator);
    let addr = SocketAddr::new(settings.server_host, settings.server_port);
    let server = ApiServer::bind(state, addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    server.run(shutdown_signal()).await?;
    Ok(())
}

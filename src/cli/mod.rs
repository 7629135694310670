// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::sync::Arc;

use crate::config::Settings;

/// Nexus AI worker
#[derive(Parser, Debug)]
#[command(name = "nexus-ai-worker")]
#[command(version)]
#[command(about = "Embedding inference worker with a generation proxy", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve(ServeArgs),

    /// Print the resolved settings and exit
    ShowConfig,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct ServeArgs {
    /// Override SERVER_HOST
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Override SERVER_PORT
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// The subcommand to run; `serve` with no overrides when omitted
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve(ServeArgs::default()))
    }
}

impl ServeArgs {
    /// Settings with command-line overrides applied
    pub fn apply(&self, settings: Arc<Settings>) -> Arc<Settings> {
        if self.host.is_none() && self.port.is_none() {
            return settings;
        }
        let mut overridden = (*settings).clone();
        if let Some(host) = self.host {
            overridden.server_host = host;
        }
        if let Some(port) = self.port {
            overridden.server_port = port;
        }
        Arc::new(overridden)
    }
}

/// Human-readable dump for `show-config`
pub fn render_settings(settings: &Settings) -> String {
    let mut lines = vec![
        format!("EMBEDDING_MODEL        = {}", settings.embedding_model),
        format!("EMBEDDING_DIM          = {}", settings.embedding_dim),
        format!("MAX_BATCH_SIZE         = {}", settings.max_batch_size),
        format!("MAX_SEQUENCE_LENGTH    = {}", settings.max_sequence_length),
        format!("SERVER_HOST            = {}", settings.server_host),
        format!("SERVER_PORT            = {}", settings.server_port),
        format!("NUM_WORKERS            = {}", settings.num_workers),
        format!("REQUEST_TIMEOUT        = {}s", settings.request_timeout.as_secs()),
        format!("MODEL_LOAD_TIMEOUT     = {}s", settings.model_load_timeout.as_secs()),
        format!("LOG_LEVEL              = {}", settings.log_level),
        format!("LOG_FORMAT             = {}", settings.log_format),
        format!("MODEL_CACHE_DIR        = {}", settings.model_cache_dir.display()),
        format!(
            "MAX_MEMORY_GB          = {}",
            settings
                .max_memory_gb
                .map(|gb| gb.to_string())
                .unwrap_or_else(|| "unset".to_string())
        ),
        format!("ENABLE_HEALTH_CHECK    = {}", settings.enable_health_check),
        format!("GENERATION_URL         = {}", settings.generation.url),
        format!("GENERATION_MODEL       = {}", settings.generation.model),
        format!(
            "GENERATION_TIMEOUT     = {}s",
            settings.generation.timeout.as_secs()
        ),
        format!("GENERATION_TEMPERATURE = {}", settings.generation.temperature),
        format!("GENERATION_NUM_PREDICT = {}", settings.generation.num_predict),
    ];
    if let Some(warning) = settings.worker_warning() {
        lines.push(format!("warning: {}", warning));
    }
    lines.join("\n")
}

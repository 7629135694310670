// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tracing subscriber setup

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, Settings};

/// Filter used when RUST_LOG is not set
///
/// ONNX Runtime and hyper are noisy at info.
pub fn default_filter(settings: &Settings) -> String {
    format!(
        "{},ort=warn,hyper=warn,tokenizers=warn",
        settings.log_level.as_filter()
    )
}

/// Install the global subscriber
///
/// RUST_LOG, when set, takes precedence over LOG_LEVEL.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(settings)));

    let installed = match settings.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

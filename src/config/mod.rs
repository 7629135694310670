// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration provider
//!
//! [`get_settings`] resolves [`Settings`] from the environment on first use
//! and hands out the same `Arc` for the rest of the process. Nothing re-reads
//! the environment after that unless [`reset_settings_cache`] is called,
//! which only test code does.

pub mod settings;

pub use settings::{
    GenerationSettings, LogFormat, LogLevel, Settings, SettingsError, DEFAULT_EMBEDDING_DIM,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_MAX_BATCH_SIZE, MAX_BATCH_SIZE_LIMIT, MAX_TIMEOUT_SECS,
};

use std::sync::{Arc, RwLock};

static SETTINGS: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

/// Process-wide settings, resolved once
///
/// A failed resolution is not cached; the error is returned and the next
/// call tries again.
pub fn get_settings() -> Result<Arc<Settings>, SettingsError> {
    if let Some(settings) = SETTINGS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .as_ref()
    {
        return Ok(settings.clone());
    }

    let mut slot = SETTINGS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(settings) = slot.as_ref() {
        return Ok(settings.clone());
    }

    let settings = Arc::new(Settings::from_env()?);
    *slot = Some(settings.clone());
    Ok(settings)
}

/// Drop the memoized settings so the next [`get_settings`] re-resolves
///
/// Test isolation only.
#[doc(hidden)]
pub fn reset_settings_cache() {
    *SETTINGS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Worker settings resolved from environment variables
//!
//! Variable names are matched case-insensitively (`EMBEDDING_MODEL` and
//! `embedding_model` are the same key) and unknown variables are ignored.
//! Every field is validated once, at construction; the resulting
//! [`Settings`] value is immutable for the rest of the process.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_EMBEDDING_MODEL: &str = "intfloat/multilingual-e5-large";
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 32;
pub const MAX_BATCH_SIZE_LIMIT: usize = 128;
pub const DEFAULT_CACHE_DIR: &str = "./models_cache";
pub const DEFAULT_GENERATION_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_GENERATION_MODEL: &str = "qwen2.5:7b";
/// Upper bound for every timeout setting, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Errors produced while resolving [`Settings`]
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A variable could not be parsed into the expected type
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A numeric variable parsed but fell outside its allowed bounds
    #[error("{key}={value} is out of range (expected {min}..={max})")]
    OutOfRange {
        key: String,
        value: String,
        min: String,
        max: String,
    },

    /// The model cache directory could not be created or resolved
    #[error("cannot prepare model cache directory {}: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err("expected one of DEBUG, INFO, WARNING, ERROR".to_string()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err("expected text or json".to_string()),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Outbound generation backend settings
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Full URL of the backend's generate endpoint
    pub url: String,
    /// Backend model identifier sent with every request
    pub model: String,
    /// Timeout for one backend call
    pub timeout: Duration,
    pub temperature: f32,
    /// Decoding ceiling forwarded as `num_predict`
    pub num_predict: u32,
}

/// Immutable worker settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Hugging Face repository id or local model directory
    pub embedding_model: String,
    /// Width of every embedding vector; must match the model's output
    pub embedding_dim: usize,
    /// Number of texts handed to the model per inference call
    pub max_batch_size: usize,
    /// Tokenizer truncation length
    pub max_sequence_length: usize,
    pub server_host: IpAddr,
    pub server_port: u16,
    /// Tokio worker threads for the HTTP runtime
    pub num_workers: usize,
    pub request_timeout: Duration,
    pub model_load_timeout: Duration,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    /// Absolute path; created during construction if missing
    pub model_cache_dir: PathBuf,
    /// Resident memory warning threshold in GB
    pub max_memory_gb: Option<f64>,
    pub enable_health_check: bool,
    pub generation: GenerationSettings,
}

impl Settings {
    /// Resolve settings from the process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped like
    /// any other unknown variable.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Resolve settings from an explicit set of variables
    ///
    /// Later duplicates (after case folding) win, mirroring how a shell
    /// environment would shadow an earlier assignment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars = VarMap::new(vars);

        let embedding_model = vars.string("embedding_model", DEFAULT_EMBEDDING_MODEL)?;
        let embedding_dim = vars.ranged("embedding_dim", DEFAULT_EMBEDDING_DIM, 1, usize::MAX)?;
        let max_batch_size = vars.ranged(
            "max_batch_size",
            DEFAULT_MAX_BATCH_SIZE,
            1,
            MAX_BATCH_SIZE_LIMIT,
        )?;
        let max_sequence_length = vars.ranged("max_sequence_length", 512usize, 1, 8192)?;

        let server_host = vars.parsed("server_host", IpAddr::from([0, 0, 0, 0]))?;
        let server_port = vars.ranged("server_port", 8001u16, 1024, 65535)?;
        let num_workers = vars.ranged("num_workers", 1usize, 1, 4)?;

        let request_timeout = vars.ranged("request_timeout", 30u64, 1, MAX_TIMEOUT_SECS)?;
        let model_load_timeout = vars.ranged("model_load_timeout", 300u64, 60, MAX_TIMEOUT_SECS)?;

        let log_level = vars.parsed("log_level", LogLevel::Info)?;
        let log_format = vars.parsed("log_format", LogFormat::Json)?;

        let max_memory_gb = match vars.get("max_memory_gb") {
            Some(_) => Some(vars.ranged("max_memory_gb", 0.0f64, 0.1, f64::MAX)?),
            None => None,
        };
        let enable_health_check = vars.flag("enable_health_check", true)?;

        let generation = GenerationSettings {
            url: vars.url("generation_url", DEFAULT_GENERATION_URL)?,
            model: vars.string("generation_model", DEFAULT_GENERATION_MODEL)?,
            timeout: Duration::from_secs(vars.ranged("generation_timeout", 120u64, 1, MAX_TIMEOUT_SECS)?),
            temperature: vars.ranged("generation_temperature", 0.7f32, 0.0, 2.0)?,
            num_predict: vars.ranged("generation_num_predict", 200u32, 1, 8192)?,
        };

        let cache_raw = vars.string("model_cache_dir", DEFAULT_CACHE_DIR)?;
        let model_cache_dir = prepare_cache_dir(Path::new(&cache_raw))?;

        Ok(Self {
            embedding_model,
            embedding_dim,
            max_batch_size,
            max_sequence_length,
            server_host,
            server_port,
            num_workers,
            request_timeout: Duration::from_secs(request_timeout),
            model_load_timeout: Duration::from_secs(model_load_timeout),
            log_level,
            log_format,
            model_cache_dir,
            max_memory_gb,
            enable_health_check,
            generation,
        })
    }

    /// Non-fatal warning when NUM_WORKERS exceeds the host's logical CPUs
    pub fn worker_warning(&self) -> Option<String> {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        worker_warning_for(self.num_workers, cpus)
    }

    /// Whether the configured model names a directory on disk
    pub fn model_is_local(&self) -> bool {
        Path::new(&self.embedding_model).is_dir()
    }
}

pub(crate) fn worker_warning_for(num_workers: usize, cpus: usize) -> Option<String> {
    (num_workers > cpus).then(|| {
        format!(
            "NUM_WORKERS ({}) exceeds logical CPU count ({}); this may degrade throughput",
            num_workers, cpus
        )
    })
}

/// Make `path` absolute and ensure the directory exists
fn prepare_cache_dir(path: &Path) -> Result<PathBuf, SettingsError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| SettingsError::CacheDir {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };

    std::fs::create_dir_all(&absolute).map_err(|source| SettingsError::CacheDir {
        path: absolute.clone(),
        source,
    })?;

    std::fs::canonicalize(&absolute).map_err(|source| SettingsError::CacheDir {
        path: absolute,
        source,
    })
}

/// Case-folded view over raw variables
struct VarMap(HashMap<String, String>);

impl VarMap {
    fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.trim())
    }

    fn invalid(key: &str, value: &str, reason: impl Into<String>) -> SettingsError {
        SettingsError::InvalidValue {
            key: key.to_ascii_uppercase(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn string(&self, key: &str, default: &str) -> Result<String, SettingsError> {
        match self.get(key) {
            Some("") => Err(Self::invalid(key, "", "must not be empty")),
            Some(v) => Ok(v.to_string()),
            None => Ok(default.to_string()),
        }
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, SettingsError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| Self::invalid(key, raw, e.to_string())),
            None => Ok(default),
        }
    }

    fn ranged<T>(&self, key: &str, default: T, min: T, max: T) -> Result<T, SettingsError>
    where
        T: FromStr + PartialOrd + fmt::Display + Copy,
        T::Err: fmt::Display,
    {
        let value = self.parsed(key, default)?;
        if !(value >= min && value <= max) {
            return Err(SettingsError::OutOfRange {
                key: key.to_ascii_uppercase(),
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(value)
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, SettingsError> {
        match self.get(key) {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(Self::invalid(key, raw, "expected a boolean")),
            },
            None => Ok(default),
        }
    }

    fn url(&self, key: &str, default: &str) -> Result<String, SettingsError> {
        let raw = self.string(key, default)?;
        let parsed = reqwest::Url::parse(&raw).map_err(|e| Self::invalid(key, &raw, e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(raw),
            other => Err(Self::invalid(
                key,
                &raw,
                format!("unsupported scheme {}", other),
            )),
        }
    }
}

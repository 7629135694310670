// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ollama-compatible generation backend client

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{
    BackendRequest, BackendResponse, DecodingOptions, Generation, GenerationError,
};
use crate::config::GenerationSettings;

/// Longest backend error body kept in [`GenerationError::Backend`]
const MAX_ERROR_BODY: usize = 512;

/// Something that turns a prompt into an answer
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError>;

    /// Backend model identifier
    fn model(&self) -> &str;
}

/// HTTP client for a `/api/generate` style endpoint
pub struct GenerationClient {
    url: String,
    model: String,
    options: DecodingOptions,
    timeout: Duration,
    client: Client,
}

impl GenerationClient {
    /// Create a client from settings
    ///
    /// The request timeout is the settings' generation timeout.
    pub fn new(settings: &GenerationSettings) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            url: settings.url.clone(),
            model: settings.model.clone(),
            options: DecodingOptions {
                temperature: settings.temperature,
                num_predict: settings.num_predict,
            },
            timeout: settings.timeout,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl GenerationBackend for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let body = BackendRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options,
        };

        debug!("Posting {} char prompt to {}", prompt.len(), self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Generation backend returned {}", status);
            return Err(GenerationError::Backend {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let data: BackendResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                GenerationError::MalformedResponse(e.to_string())
            }
        })?;

        Ok(Generation {
            answer: data.response,
            model: self.model.clone(),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

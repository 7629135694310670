// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request type for POST /api/v1/generate

use crate::api::embed::request::{validate_text, MAX_TEXT_CHARS};
use crate::api::embed::MAX_TEXTS_PER_REQUEST;
use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Request body for POST /api/v1/generate
///
/// # Fields
/// - `query`: The question, non-blank
/// - `context`: Retrieved passages in rank order (0-100 items)
/// - `max_tokens`: Requested answer length (default: 500)
///
/// # Example
/// ```json
/// {
///   "query": "When was Kyoto the capital?",
///   "context": ["Kyoto was the imperial capital from 794 to 1868."],
///   "max_tokens": 300
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub query: String,

    pub context: Vec<String>,

    /// Accepted and validated; the backend ceiling comes from settings
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
}

fn default_max_tokens() -> i64 {
    500
}

impl GenerateRequest {
    /// Validates the request
    ///
    /// # Validation Rules
    /// 1. **query**: Non-blank, at most 10000 characters
    /// 2. **context**: At most 100 passages, each at most 10000 characters
    /// 3. **max_tokens**: At least 1
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_text("query", &self.query)?;

        if self.context.len() > MAX_TEXTS_PER_REQUEST {
            return Err(ApiError::ValidationError {
                field: "context".to_string(),
                message: format!(
                    "context cannot contain more than {} passages (got {})",
                    MAX_TEXTS_PER_REQUEST,
                    self.context.len()
                ),
            });
        }

        for (index, passage) in self.context.iter().enumerate() {
            let chars = passage.chars().count();
            if chars > MAX_TEXT_CHARS {
                return Err(ApiError::ValidationError {
                    field: format!("context[{}]", index),
                    message: format!(
                        "passage cannot exceed {} characters (got {} characters)",
                        MAX_TEXT_CHARS, chars
                    ),
                });
            }
        }

        if self.max_tokens < 1 {
            return Err(ApiError::ValidationError {
                field: "max_tokens".to_string(),
                message: format!("max_tokens must be at least 1 (got {})", self.max_tokens),
            });
        }

        Ok(())
    }
}

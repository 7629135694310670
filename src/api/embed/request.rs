// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request types for the embedding endpoints
//!
//! Validation happens here, before any engine call.

use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Most texts accepted in one document request
pub const MAX_TEXTS_PER_REQUEST: usize = 100;

/// Longest accepted text, in characters
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Request body for POST /api/v1/embed
///
/// # Fields
/// - `texts`: 1-100 non-blank strings, each at most 10000 characters
///
/// # Example
/// ```json
/// {
///   "texts": ["Tokyo is the capital of Japan", "Kyoto was the old capital"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedDocumentsRequest {
    pub texts: Vec<String>,
}

impl EmbedDocumentsRequest {
    /// Validates the request
    ///
    /// # Validation Rules
    /// 1. **texts**: Must contain 1-100 items
    /// 2. **whitespace**: Texts cannot be empty or whitespace-only
    /// 3. **text length**: Each text must be at most 10000 characters
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.texts.is_empty() {
            return Err(ApiError::ValidationError {
                field: "texts".to_string(),
                message: "texts array must contain at least 1 item".to_string(),
            });
        }

        if self.texts.len() > MAX_TEXTS_PER_REQUEST {
            return Err(ApiError::ValidationError {
                field: "texts".to_string(),
                message: format!(
                    "texts array cannot contain more than {} items (got {})",
                    MAX_TEXTS_PER_REQUEST,
                    self.texts.len()
                ),
            });
        }

        for (index, text) in self.texts.iter().enumerate() {
            validate_text(&format!("texts[{}]", index), text)?;
        }

        Ok(())
    }
}

/// Request body for POST /api/v1/embed/query
///
/// # Example
/// ```json
/// { "text": "What is the capital of Japan?" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedQueryRequest {
    pub text: String,
}

impl EmbedQueryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_text("text", &self.text)
    }
}

/// Non-blank and within [`MAX_TEXT_CHARS`]
pub(crate) fn validate_text(field: &str, text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: field.to_string(),
            message: "text cannot be empty or contain only whitespace".to_string(),
        });
    }

    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(ApiError::ValidationError {
            field: field.to_string(),
            message: format!(
                "text cannot exceed {} characters (got {} characters)",
                MAX_TEXT_CHARS, chars
            ),
        });
    }

    Ok(())
}

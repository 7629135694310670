// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

/// Response body for POST /api/v1/generate
///
/// # Example
/// ```json
/// { "answer": "From 794 to 1868.", "model": "qwen2.5:7b" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub answer: String,
    pub model: String,
}

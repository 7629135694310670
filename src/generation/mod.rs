// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation proxy
//!
//! Stateless: builds a prompt from caller passages and forwards it to the
//! configured backend.

pub mod client;
pub mod prompt;
pub mod types;

pub use client::{GenerationBackend, GenerationClient};
pub use prompt::build_rag_prompt;
pub use types::{DecodingOptions, Generation, GenerationError};

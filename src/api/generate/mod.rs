// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Generation proxy API Module

pub mod handler;
pub mod request;
pub mod response;

pub use handler::generate_handler;
pub use request::GenerateRequest;
pub use response::GenerateResponse;

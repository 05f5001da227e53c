// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for toucan-core operations.

use thiserror::Error;

use crate::operation::Operation;

/// All possible errors that can occur in toucan-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{operation} request is not signed\n  hint: the digest primitive failed while building it")]
    Unsigned { operation: Operation },

    #[error("invalid operation: '{0}'")]
    InvalidOperation(String),

    #[error("invalid job id: '{0}'")]
    InvalidJobId(String),

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for toucan-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;
use toucan_core::Operation;

use crate::queue::QueueError;
use crate::transport::TransportError;

/// All possible errors that can occur in the toucan client.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{operation}: notification token not established\n  hint: run 'toucan register --token <TOKEN>' first")]
    Precondition { operation: Operation },

    #[error("{operation}: request could not be signed\n  hint: nothing was sent or queued")]
    Signing { operation: Operation },

    #[error("job could not be persisted: {0}")]
    Persistence(QueueError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("config error: {0}")]
    Config(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(toucan_core::Error),
}

/// A specialized Result type for toucan client operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<toucan_core::Error> for Error {
    fn from(e: toucan_core::Error) -> Self {
        match e {
            toucan_core::Error::Unsigned { operation } => Error::Signing { operation },
            toucan_core::Error::Json(e) => Error::Json(e),
            other => Error::Core(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

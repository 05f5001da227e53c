// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint URLs resolved against a base URL.

use crate::operation::Operation;

/// Default notification backend.
pub const DEFAULT_BASE_URL: &str = "https://api.toucan.javocsoft.es";

/// Resolves operation endpoints against a fixed base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Creates endpoints for the given base URL override, or the default
    /// backend when `base` is `None` or empty.
    pub fn new(base: Option<&str>) -> Self {
        let base = match base {
            Some(b) if !b.trim().is_empty() => b.trim().trim_end_matches('/'),
            _ => DEFAULT_BASE_URL,
        };
        Endpoints {
            base: base.to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Full endpoint URL for an operation, including its query discriminator.
    pub fn url(&self, op: Operation) -> String {
        format!("{}{}{}", self.base, op.path(), op.query())
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;

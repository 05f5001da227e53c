// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Digest primitive used for request signatures.
//!
//! The backend recomputes every signature, so the algorithm and the hex
//! rendering must match it byte for byte. SHA-1 is the wire default.

use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::sync::Arc;

/// Error raised when a digest cannot be computed.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("digest algorithm unavailable: {0}")]
    Unavailable(String),
}

/// A one-way hash over strings, rendered as lowercase hex.
pub trait Digester: Send + Sync {
    fn digest(&self, data: &str) -> Result<String, DigestError>;
}

/// SHA-1, the algorithm the backend verifies against.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Digester;

impl Digester for Sha1Digester {
    fn digest(&self, data: &str) -> Result<String, DigestError> {
        Ok(hex::encode(sha1::Sha1::digest(data.as_bytes())))
    }
}

/// SHA-256, for backends configured with the stronger digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Digester;

impl Digester for Sha256Digester {
    fn digest(&self, data: &str) -> Result<String, DigestError> {
        Ok(hex::encode(sha2::Sha256::digest(data.as_bytes())))
    }
}

/// Digest algorithm selectable from configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    pub fn digester(self) -> Arc<dyn Digester> {
        match self {
            DigestAlgorithm::Sha1 => Arc::new(Sha1Digester),
            DigestAlgorithm::Sha256 => Arc::new(Sha256Digester),
        }
    }
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;

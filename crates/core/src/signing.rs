// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request signing.
//!
//! Two signatures travel with every request:
//!
//! - `appHashSignature = digest(appKey + apiToken)` authenticates the
//!   application/installation pair.
//! - `hashSignature = digest(appKey + "/" + dataString)` authenticates the
//!   payload, where `dataString` is the canonical rendering of the signed
//!   fields (see [`canonical`]).
//!
//! A failed digest leaves the signature unset; callers must treat an
//! unsigned request as unsendable.

use std::fmt;
use std::sync::Arc;

use crate::digest::{DigestAlgorithm, Digester};

/// Separator between canonical fields.
pub const DELIMITER: &str = ";#;";

/// Rendering of an absent or empty string field.
pub const SENTINEL: &str = "NONE";

/// Renders an optional string field for the canonical data string.
pub fn field(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => SENTINEL,
    }
}

/// Joins already-rendered fields with [`DELIMITER`].
pub fn canonical<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, f) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push_str(DELIMITER);
        }
        out.push_str(f.as_ref());
    }
    out
}

/// Signs requests for one application key and API token.
#[derive(Clone)]
pub struct Signer {
    app_key: String,
    api_token: String,
    digester: Arc<dyn Digester>,
}

impl Signer {
    pub fn new(
        app_key: impl Into<String>,
        api_token: impl Into<String>,
        digester: Arc<dyn Digester>,
    ) -> Self {
        Signer {
            app_key: app_key.into(),
            api_token: api_token.into(),
            digester,
        }
    }

    /// Signer using the given configured algorithm.
    pub fn with_algorithm(
        app_key: impl Into<String>,
        api_token: impl Into<String>,
        algorithm: DigestAlgorithm,
    ) -> Self {
        Self::new(app_key, api_token, algorithm.digester())
    }

    /// The application public key.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// `digest(appKey + apiToken)`, or `None` if the digest failed.
    pub fn app_hash_signature(&self) -> Option<String> {
        self.digest(&format!("{}{}", self.app_key, self.api_token))
    }

    /// `digest(appKey + "/" + data)`, or `None` if the digest failed.
    pub fn hash_signature(&self, data: &str) -> Option<String> {
        self.digest(&format!("{}/{}", self.app_key, data))
    }

    fn digest(&self, input: &str) -> Option<String> {
        match self.digester.digest(input) {
            Ok(sig) => Some(sig),
            Err(e) => {
                tracing::error!("signature left unset: {}", e);
                None
            }
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("app_key", &self.app_key)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[path = "signing_tests.rs"]
mod tests;

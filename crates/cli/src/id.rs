// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Generate a device id from a seed and timestamp.
/// Format: 16 hex chars of SHA256(seed + timestamp + pid)
pub fn generate_device_id(seed: &str, created_at: &DateTime<Utc>) -> String {
    let input = format!("{}{}{}", seed, created_at.to_rfc3339(), std::process::id());
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(&hash[..8])
}

/// Returns true if `id` looks like a generated device id.
pub fn is_device_id(id: &str) -> bool {
    id.len() == 16 && id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

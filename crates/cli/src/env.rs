// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the client are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `TOUCAN_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var(vars::TOUCAN_CONFIG).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the value of `TOUCAN_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(vars::TOUCAN_STATE_DIR).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Device locale derived from `LANG`, e.g. `es_ES.UTF-8` → `es_ES`.
pub fn locale() -> Option<String> {
    let lang = std::env::var(vars::LANG).ok()?;
    parse_locale(&lang)
}

fn parse_locale(lang: &str) -> Option<String> {
    let base = lang.split(['.', '@']).next().unwrap_or_default().trim();
    match base {
        "" | "C" | "POSIX" => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

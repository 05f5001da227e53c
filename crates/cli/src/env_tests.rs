// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::path::PathBuf;
use yare::parameterized;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::TOUCAN_CONFIG, "TOUCAN_CONFIG");
    assert_eq!(vars::TOUCAN_STATE_DIR, "TOUCAN_STATE_DIR");
    assert_eq!(vars::LANG, "LANG");
}

#[test]
fn test_config_path_set_and_unset() {
    std::env::set_var("TOUCAN_CONFIG", "/tmp/toucan-test.toml");
    assert_eq!(config_path(), Some(PathBuf::from("/tmp/toucan-test.toml")));
    std::env::set_var("TOUCAN_CONFIG", "");
    assert_eq!(config_path(), None);
    std::env::remove_var("TOUCAN_CONFIG");
    assert_eq!(config_path(), None);
}

#[test]
fn test_state_dir_set_and_unset() {
    std::env::set_var("TOUCAN_STATE_DIR", "/tmp/toucan-state");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/toucan-state")));
    std::env::remove_var("TOUCAN_STATE_DIR");
    assert_eq!(state_dir(), None);
}

#[parameterized(
    with_encoding = { "es_ES.UTF-8", Some("es_ES") },
    with_modifier = { "de_DE@euro", Some("de_DE") },
    bare = { "en", Some("en") },
    c_locale = { "C", None },
    posix = { "POSIX", None },
    c_utf8 = { "C.UTF-8", None },
    empty = { "", None },
)]
fn test_parse_locale(lang: &str, expected: Option<&str>) {
    assert_eq!(parse_locale(lang).as_deref(), expected);
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read once from `toucan.toml` and is immutable
//! afterwards. It holds the application credentials, the endpoint
//! override, delivery tuning, and the device details reported on
//! registration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use toucan_core::{DigestAlgorithm, Endpoints, Signer};

use crate::env;
use crate::error::{Error, Result};

const CONFIG_DIR_NAME: &str = "toucan";
const CONFIG_FILE_NAME: &str = "toucan.toml";
const QUEUE_DIR_NAME: &str = "queue";
const PREFS_FILE_NAME: &str = "prefs.json";

/// Client configuration stored in `toucan.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API token issued for the application.
    pub api_token: String,
    /// Application public key (`appKey` on the wire).
    pub app_public_key: String,
    /// Base URL override; the public backend when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Accept any TLS certificate. Opt-in, for test backends only.
    #[serde(default)]
    pub skip_tls_verify: bool,
    #[serde(default)]
    pub digest: DigestAlgorithm,
    /// Where preferences and the job queue live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Delivery tuning shared by online dispatch and the delivery driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum concurrent network calls.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Attempts before a job is dead-lettered.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failed replay (milliseconds).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on the retry delay (seconds).
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Interval between delivery passes when nothing wakes the driver (seconds).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Connect and read timeout for each call (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_in_flight() -> usize {
    8
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_secs() -> u64 {
    3600
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        DeliveryConfig {
            max_in_flight: default_max_in_flight(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Delay before retrying a job that has failed `attempts` times:
    /// `initial_backoff_ms * 2^(attempts-1)`, capped at `max_backoff_secs`.
    pub fn backoff_ms(&self, attempts: u32) -> u64 {
        let cap = self.max_backoff_secs.saturating_mul(1000);
        let mut delay_ms = std::cmp::min(self.initial_backoff_ms, cap);
        for _ in 1..attempts {
            if delay_ms >= cap {
                break;
            }
            delay_ms = std::cmp::min(delay_ms.saturating_mul(2), cap);
        }
        delay_ms
    }
}

/// Device details reported in the registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_app_version")]
    pub app_version: i32,
    /// Defaults to the locale in `LANG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    /// Defaults to `<os> <arch>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

fn default_app_version() -> i32 {
    1
}

fn default_resolution() -> String {
    "NORMAL".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            app_version: default_app_version(),
            locale: None,
            resolution: default_resolution(),
            os: None,
            extra: None,
        }
    }
}

impl DeviceConfig {
    pub fn locale(&self) -> String {
        self.locale.clone().or_else(env::locale).unwrap_or_else(|| "en".to_string())
    }

    pub fn os(&self) -> String {
        self.os
            .clone()
            .unwrap_or_else(|| format!("{} {}", std::env::consts::OS, std::env::consts::ARCH))
    }
}

impl Config {
    /// Config for the given credentials with every other setting defaulted.
    pub fn new(api_token: impl Into<String>, app_public_key: impl Into<String>) -> Self {
        Config {
            api_token: api_token.into(),
            app_public_key: app_public_key.into(),
            endpoint: None,
            skip_tls_verify: false,
            digest: DigestAlgorithm::default(),
            state_dir: None,
            delivery: DeliveryConfig::default(),
            device: DeviceConfig::default(),
        }
    }

    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::Config("api_token must not be empty".to_string()));
        }
        if self.app_public_key.trim().is_empty() {
            return Err(Error::Config("app_public_key must not be empty".to_string()));
        }
        if self.delivery.max_in_flight == 0 {
            return Err(Error::Config("delivery.max_in_flight must be at least 1".to_string()));
        }
        if self.delivery.max_attempts == 0 {
            return Err(Error::Config("delivery.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Resolves the config file: explicit path, then `TOUCAN_CONFIG`, then
    /// the user config directory.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = env::config_path() {
            return path;
        }
        dirs::config_dir()
            .map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Resolves the state directory: config, then `TOUCAN_STATE_DIR`, then
    /// the user data directory.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        if let Some(dir) = env::state_dir() {
            return dir;
        }
        dirs::data_dir()
            .map(|d| d.join(CONFIG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(".toucan"))
    }

    pub fn queue_dir(&self) -> PathBuf {
        self.state_dir().join(QUEUE_DIR_NAME)
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.state_dir().join(PREFS_FILE_NAME)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(self.endpoint.as_deref())
    }

    pub fn signer(&self) -> Signer {
        Signer::with_algorithm(&self.app_public_key, &self.api_token, self.digest)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable device preferences.
//!
//! Two values survive restarts: the device id, generated once, and the
//! notification token from the last registration. [`FilePreferences`]
//! keeps them in a small JSON file written atomically with fsync.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;
use crate::id::generate_device_id;

/// Key-value store for the values the client must remember.
pub trait Preferences: Send + Sync {
    fn device_id(&self) -> Option<String>;

    fn set_device_id(&self, id: &str) -> Result<()>;

    fn notification_token(&self) -> Option<String>;

    fn set_notification_token(&self, token: &str) -> Result<()>;
}

/// Returns the stored device id, generating and storing one on first use.
pub fn ensure_device_id(prefs: &dyn Preferences, seed: &str) -> Result<String> {
    if let Some(id) = prefs.device_id().filter(|id| !id.is_empty()) {
        return Ok(id);
    }
    let id = generate_device_id(seed, &chrono::Utc::now());
    prefs.set_device_id(&id)?;
    tracing::info!(device_id = %id, "generated device id");
    Ok(id)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notification_token: Option<String>,
}

/// Preferences persisted as JSON at a fixed path.
pub struct FilePreferences {
    path: PathBuf,
    state: Mutex<PrefsFile>,
}

impl FilePreferences {
    /// Opens the preference file, starting empty if it does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        let state = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PrefsFile::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(FilePreferences { path: path.to_path_buf(), state: Mutex::new(state) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut PrefsFile)) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = state.clone();
        apply(&mut next);
        self.write(&next)?;
        *state = next;
        Ok(())
    }

    fn write(&self, prefs: &PrefsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(serde_json::to_string_pretty(prefs)?.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read(&self) -> PrefsFile {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Preferences for FilePreferences {
    fn device_id(&self) -> Option<String> {
        self.read().device_id
    }

    fn set_device_id(&self, id: &str) -> Result<()> {
        self.update(|p| p.device_id = Some(id.to_string()))
    }

    fn notification_token(&self) -> Option<String> {
        self.read().notification_token
    }

    fn set_notification_token(&self, token: &str) -> Result<()> {
        self.update(|p| p.notification_token = Some(token.to_string()))
    }
}

#[cfg(test)]
#[path = "prefs_tests.rs"]
mod tests;

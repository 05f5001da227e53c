// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for toucan-core tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use crate::digest::{DigestError, Digester};
use crate::signing::Signer;

/// Records every digest input and echoes it back as `<input>`.
#[derive(Default)]
pub struct RecordingDigester {
    pub inputs: Mutex<Vec<String>>,
}

impl Digester for RecordingDigester {
    fn digest(&self, data: &str) -> Result<String, DigestError> {
        self.inputs.lock().unwrap().push(data.to_string());
        Ok(format!("<{}>", data))
    }
}

/// Always fails, like a platform without the hash algorithm.
pub struct FailingDigester;

impl Digester for FailingDigester {
    fn digest(&self, _data: &str) -> Result<String, DigestError> {
        Err(DigestError::Unavailable("test".into()))
    }
}

/// Signer whose signatures are readable: `<input>`.
pub fn echo_signer() -> Signer {
    Signer::new("PK", "AT", Arc::new(RecordingDigester::default()))
}

/// Signer that never produces a signature.
pub fn failing_signer() -> Signer {
    Signer::new("PK", "AT", Arc::new(FailingDigester))
}

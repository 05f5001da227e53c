// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers.
//!
//! A job id is the operation's wire name followed by a decimal timestamp,
//! e.g. `DeviceRegistration1760000000123`. The generator never hands out the
//! same timestamp twice, so ids are unique within a process even when the
//! wall clock stalls or steps backwards. Separate processes can still pick
//! the same id; whoever stores jobs must refuse duplicates and ask the
//! generator for the next one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::operation::Operation;

/// Source of wall-clock time, injectable for tests.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now_ms(&self) -> u64 {
        (*self).now_ms()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Identifier of one durable job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(operation: Operation, stamp: u64) -> Self {
        JobId(format!("{}{}", operation.name(), stamp))
    }

    /// Parses `<OperationName><digits>`.
    pub fn parse(s: &str) -> Result<Self> {
        let digits_at = s.find(|c: char| c.is_ascii_digit()).ok_or_else(|| Error::InvalidJobId(s.to_string()))?;
        let (name, stamp) = s.split_at(digits_at);
        if !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidJobId(s.to_string()));
        }
        name.parse::<Operation>().map_err(|_| Error::InvalidJobId(s.to_string()))?;
        Ok(JobId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The operation encoded in the id prefix.
    pub fn operation(&self) -> Result<Operation> {
        let name = self.0.trim_end_matches(|c: char| c.is_ascii_digit());
        name.parse().map_err(|_| Error::InvalidJobId(self.0.clone()))
    }

    /// The timestamp suffix.
    pub fn stamp(&self) -> Option<u64> {
        let name = self.0.trim_end_matches(|c: char| c.is_ascii_digit());
        self.0[name.len()..].parse().ok()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out job ids with strictly increasing timestamps.
pub struct JobIdGenerator<C: ClockSource = SystemClock> {
    clock: C,
    last: AtomicU64,
}

impl JobIdGenerator<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for JobIdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> JobIdGenerator<C> {
    pub fn with_clock(clock: C) -> Self {
        JobIdGenerator { clock, last: AtomicU64::new(0) }
    }

    pub fn next(&self, operation: Operation) -> JobId {
        let now = self.clock.now_ms();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last.saturating_add(1))))
            .unwrap_or_else(|last| last);
        JobId::new(operation, now.max(prev.saturating_add(1)))
    }
}

#[cfg(test)]
#[path = "job_id_tests.rs"]
mod tests;

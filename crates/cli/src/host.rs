// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background task host.
//!
//! After a job is persisted the client asks the host to schedule a
//! delivery pass. The hint is best-effort; the driver also polls.

use std::sync::Arc;

use tokio::sync::Notify;

/// Schedules the delivery driver.
pub trait TaskHost: Send + Sync {
    fn schedule_delivery(&self);
}

/// Wakes an in-process delivery loop through a shared [`Notify`].
///
/// A wake-up sent while the loop is busy is kept and consumed by its next
/// wait, so hints are never lost between passes.
#[derive(Debug, Clone, Default)]
pub struct NotifyHost {
    notify: Arc<Notify>,
}

impl NotifyHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle the delivery loop waits on.
    pub fn handle(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }
}

impl TaskHost for NotifyHost {
    fn schedule_delivery(&self) {
        tracing::debug!("delivery pass requested");
        self.notify.notify_one();
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery driver.
//!
//! Drains the job store. A pass snapshots the pending ids and attempts each
//! one once, concurrently up to `max_in_flight`:
//!
//! ```text
//! claim ─► load ─► due? ─► run worker ─┬─ ok ──► remove
//!   │               │                  └─ err ─► attempts+1, defer
//!   └─ busy         └─ deferred                  └─ exhausted ─► failed/
//! ```
//!
//! Jobs persisted during a pass are left for the next one.

use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use toucan_core::{ClockSource, JobId, SystemClock};

use crate::callback::CallbackRouter;
use crate::config::DeliveryConfig;
use crate::connectivity::Connectivity;
use crate::dispatch::DispatchWorker;
use crate::queue::{JobStore, QueueError, QueueResult};
use crate::transport::HttpTransport;

/// What happened to each job in a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Delivered and removed from the store.
    pub delivered: usize,
    /// Failed and scheduled for retry.
    pub failed: usize,
    /// Not yet due.
    pub deferred: usize,
    /// Claimed by another worker, or already gone.
    pub busy: usize,
    /// Failed for the last allowed time and moved to `failed/`.
    pub dead_lettered: usize,
}

impl PassReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed + self.dead_lettered
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Delivered => self.delivered += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Deferred => self.deferred += 1,
            Outcome::Busy => self.busy += 1,
            Outcome::DeadLettered => self.dead_lettered += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Delivered,
    Failed,
    Deferred,
    Busy,
    DeadLettered,
}

/// Replays persisted jobs.
#[derive(Clone)]
pub struct DeliveryDriver {
    store: Arc<JobStore>,
    transport: Arc<dyn HttpTransport>,
    callbacks: Arc<CallbackRouter>,
    settings: DeliveryConfig,
    clock: Arc<dyn ClockSource>,
}

impl DeliveryDriver {
    pub fn new(
        store: Arc<JobStore>,
        transport: Arc<dyn HttpTransport>,
        callbacks: Arc<CallbackRouter>,
        settings: DeliveryConfig,
    ) -> Self {
        Self::with_clock(store, transport, callbacks, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<JobStore>,
        transport: Arc<dyn HttpTransport>,
        callbacks: Arc<CallbackRouter>,
        settings: DeliveryConfig,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        DeliveryDriver { store, transport, callbacks, settings, clock }
    }

    /// Attempts every job pending at the start of the pass once.
    pub async fn run_pass(&self) -> QueueResult<PassReport> {
        let ids = self.store.pending()?;
        let mut report = PassReport::default();
        if ids.is_empty() {
            return Ok(report);
        }
        tracing::info!(pending = ids.len(), "delivery pass started");

        let permits = Arc::new(Semaphore::new(self.settings.max_in_flight.max(1)));
        let mut tasks = JoinSet::new();
        for id in ids {
            let driver = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let result = driver.attempt(&id).await;
                (id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => report.record(outcome),
                Ok((id, Err(e))) => {
                    tracing::error!(job = %id, "delivery attempt aborted: {}", e);
                    report.record(Outcome::Busy);
                }
                Err(e) => tracing::error!("delivery task panicked: {}", e),
            }
        }

        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            deferred = report.deferred,
            busy = report.busy,
            dead_lettered = report.dead_lettered,
            "delivery pass finished"
        );
        Ok(report)
    }

    async fn attempt(&self, id: &JobId) -> QueueResult<Outcome> {
        let Some(_claim) = self.store.claim(id)? else {
            return Ok(Outcome::Busy);
        };
        let mut job = match self.store.load(id) {
            Ok(job) => job,
            Err(QueueError::NotFound(_)) => return Ok(Outcome::Busy),
            Err(QueueError::Corrupt { reason, .. }) => {
                tracing::error!(job = %id, "unreadable job: {}", reason);
                self.store.dead_letter(id)?;
                return Ok(Outcome::DeadLettered);
            }
            Err(e) => return Err(e),
        };
        let now = self.clock.now_ms();
        if !job.is_due(now) {
            return Ok(Outcome::Deferred);
        }

        let callback = self.callbacks.resolve(&job.id, job.operation);
        let mut worker = DispatchWorker::new(job.clone(), Some(callback));
        let completion = match worker.run(self.transport.as_ref()).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("{}", e);
                return Ok(Outcome::Busy);
            }
        };

        match completion.result {
            Ok(_) => {
                self.store.remove(id)?;
                self.callbacks.forget(id);
                Ok(Outcome::Delivered)
            }
            Err(e) => {
                let attempts = job.attempts.saturating_add(1);
                if attempts >= self.settings.max_attempts {
                    job.record_failure(e.to_string(), now);
                    self.store.update(&job)?;
                    self.store.dead_letter(id)?;
                    self.callbacks.forget(id);
                    return Ok(Outcome::DeadLettered);
                }
                let delay = self.settings.backoff_ms(attempts);
                tracing::warn!(job = %id, attempts, retry_in_ms = delay, "delivery failed: {}", e);
                job.record_failure(e.to_string(), now.saturating_add(delay));
                self.store.update(&job)?;
                Ok(Outcome::Failed)
            }
        }
    }

    /// Runs passes until `shutdown` is cancelled.
    ///
    /// A pass runs at start, whenever `wake` is notified, and every poll
    /// interval, but only if a fresh [`Connectivity::refresh`] reports
    /// online. The refresh also updates the state client calls read.
    pub async fn run(&self, connectivity: Arc<dyn Connectivity>, wake: Arc<Notify>, shutdown: CancellationToken) {
        let poll = self.settings.poll_interval();
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            if refresh(&connectivity).await {
                if let Err(e) = self.run_pass().await {
                    tracing::error!("delivery pass failed: {}", e);
                }
            } else {
                tracing::debug!("offline, skipping delivery pass");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = wake.notified() => {}
                _ = tokio::time::sleep(poll) => {}
            }
        }
        tracing::info!("delivery driver stopped");
    }
}

/// Re-checks connectivity on a blocking thread, updating what client calls see.
async fn refresh(connectivity: &Arc<dyn Connectivity>) -> bool {
    let probe = Arc::clone(connectivity);
    tokio::task::spawn_blocking(move || probe.refresh()).await.unwrap_or(false)
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;

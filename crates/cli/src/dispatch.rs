// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch workers.
//!
//! A [`DispatchWorker`] owns one signed [`Job`] and performs exactly one
//! call for it. The [`Dispatcher`] runs workers on the tokio runtime,
//! bounded by a semaphore, so the calling thread never waits on the
//! network.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use toucan_core::Job;

use crate::callback::{Completion, ResponseCallback};
use crate::transport::HttpTransport;

/// Lifecycle of a worker. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    Succeeded,
    Failed,
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Succeeded | WorkerState::Failed)
    }
}

/// Error returned when a worker is run outside the `Created` state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("worker for {job} already ran (state {state:?})")]
pub struct AlreadyRan {
    pub job: String,
    pub state: WorkerState,
}

/// Executes exactly one network call for one job.
pub struct DispatchWorker {
    job: Job,
    callback: Option<Arc<dyn ResponseCallback>>,
    state: WorkerState,
}

impl DispatchWorker {
    pub fn new(job: Job, callback: Option<Arc<dyn ResponseCallback>>) -> Self {
        DispatchWorker { job, callback, state: WorkerState::Created }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Performs the call and reports it to the callback.
    ///
    /// Only a `Created` worker runs; any other state returns [`AlreadyRan`]
    /// without touching the network or the callback.
    pub async fn run(&mut self, transport: &dyn HttpTransport) -> Result<Completion, AlreadyRan> {
        if self.state != WorkerState::Created {
            return Err(AlreadyRan { job: self.job.id.to_string(), state: self.state });
        }
        self.state = WorkerState::Running;
        tracing::debug!(job = %self.job.id, method = %self.job.request.method(), "worker running");

        let result = transport.execute(&self.job.request, self.job.skip_tls_verify).await;
        self.state = if result.is_ok() { WorkerState::Succeeded } else { WorkerState::Failed };
        tracing::debug!(job = %self.job.id, state = ?self.state, "worker finished");

        let completion = Completion { operation: self.job.operation, job_id: self.job.id.clone(), result };
        if let Some(callback) = &self.callback {
            callback.on_response(&completion);
        }
        Ok(completion)
    }
}

/// Runs workers in the background with bounded concurrency.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    handle: Handle,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, max_in_flight: usize, handle: Handle) -> Self {
        Dispatcher {
            transport,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            tracker: TaskTracker::new(),
            handle,
        }
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Starts the worker and returns immediately.
    pub fn spawn(&self, mut worker: DispatchWorker) {
        let transport = Arc::clone(&self.transport);
        let permits = Arc::clone(&self.permits);
        self.tracker.spawn_on(
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                if let Err(e) = worker.run(transport.as_ref()).await {
                    tracing::error!("{}", e);
                }
            },
            &self.handle,
        );
    }

    /// Number of spawned workers that have not finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits for every spawned worker to finish.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

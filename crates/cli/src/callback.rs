// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Result notification for completed calls.
//!
//! Every worker reports exactly one [`Completion`]. Which callback hears it
//! is decided by [`CallbackRouter`]:
//!
//! 1. the callback the caller passed, if the job was queued by this process
//!    and that callback is still registered;
//! 2. otherwise the registry handler for the operation kind;
//! 3. otherwise [`LogCallback`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use toucan_core::{JobId, Operation};

use crate::transport::TransportError;

/// The outcome of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub operation: Operation,
    pub job_id: JobId,
    /// Response body, or the transport failure.
    pub result: Result<String, TransportError>,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Receives the outcome of a call.
pub trait ResponseCallback: Send + Sync {
    fn on_response(&self, completion: &Completion);
}

impl<F> ResponseCallback for F
where
    F: Fn(&Completion) + Send + Sync,
{
    fn on_response(&self, completion: &Completion) {
        self(completion)
    }
}

/// Default callback: logs the outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCallback;

impl ResponseCallback for LogCallback {
    fn on_response(&self, completion: &Completion) {
        match &completion.result {
            Ok(body) => {
                tracing::info!(operation = %completion.operation, job = %completion.job_id, "completed: {}", body)
            }
            Err(e) => {
                tracing::warn!(operation = %completion.operation, job = %completion.job_id, "failed: {}", e)
            }
        }
    }
}

/// Per-operation handlers with a log-only fallback.
pub struct CallbackRegistry {
    handlers: RwLock<HashMap<Operation, Arc<dyn ResponseCallback>>>,
    fallback: Arc<dyn ResponseCallback>,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(LogCallback))
    }

    pub fn with_fallback(fallback: Arc<dyn ResponseCallback>) -> Self {
        CallbackRegistry { handlers: RwLock::new(HashMap::new()), fallback }
    }

    /// Sets the handler for an operation kind, replacing any previous one.
    pub fn register(&self, operation: Operation, callback: Arc<dyn ResponseCallback>) {
        self.handlers.write().unwrap_or_else(|e| e.into_inner()).insert(operation, callback);
    }

    pub fn resolve(&self, operation: Operation) -> Arc<dyn ResponseCallback> {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&operation)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

/// Routes completions to live caller callbacks or the registry.
#[derive(Default)]
pub struct CallbackRouter {
    live: Mutex<HashMap<JobId, Arc<dyn ResponseCallback>>>,
    registry: CallbackRegistry,
}

impl CallbackRouter {
    pub fn new(registry: CallbackRegistry) -> Self {
        CallbackRouter { live: Mutex::new(HashMap::new()), registry }
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Remembers the caller's callback for a queued job.
    pub fn remember(&self, job_id: JobId, callback: Arc<dyn ResponseCallback>) {
        self.live.lock().unwrap_or_else(|e| e.into_inner()).insert(job_id, callback);
    }

    /// Drops the live callback once its job reached a final outcome.
    pub fn forget(&self, job_id: &JobId) {
        self.live.lock().unwrap_or_else(|e| e.into_inner()).remove(job_id);
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// The callback that should hear about `job_id`.
    pub fn resolve(&self, job_id: &JobId, operation: Operation) -> Arc<dyn ResponseCallback> {
        if let Some(cb) = self.live.lock().unwrap_or_else(|e| e.into_inner()).get(job_id) {
            return Arc::clone(cb);
        }
        self.registry.resolve(operation)
    }
}

#[cfg(test)]
#[path = "callback_tests.rs"]
mod tests;

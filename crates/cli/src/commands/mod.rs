// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod deliver;
pub mod pending;

use std::sync::{Arc, Mutex};

use tokio::runtime::Runtime;
use tokio::sync::Notify;

use crate::callback::{CallbackRegistry, Completion, ResponseCallback};
use crate::client::{Collaborators, Submission, ToucanClient};
use crate::config::Config;
use crate::connectivity::{Connectivity, ProbedConnectivity, StaticConnectivity, TcpProbe};
use crate::error::{Error, Result};
use crate::host::NotifyHost;
use crate::prefs::FilePreferences;
use crate::transport::{ReqwestTransport, TransportError};

/// Prints every completion and remembers the last failure.
#[derive(Default)]
pub struct Reporter {
    failure: Mutex<Option<TransportError>>,
}

impl Reporter {
    /// The most recent transport failure, if any call failed.
    pub fn take_failure(&self) -> Option<TransportError> {
        self.failure.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl ResponseCallback for Reporter {
    fn on_response(&self, completion: &Completion) {
        match &completion.result {
            Ok(body) if body.is_empty() => println!("{}: ok", completion.operation),
            Ok(body) => println!("{}: {}", completion.operation, body),
            Err(e) => {
                eprintln!("{} ({}) failed: {}", completion.operation, completion.job_id, e);
                *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(e.clone());
            }
        }
    }
}

/// Everything one command invocation needs.
pub struct Session {
    pub runtime: Runtime,
    pub client: ToucanClient,
    pub connectivity: Arc<dyn Connectivity>,
    pub wake: Arc<Notify>,
    pub reporter: Arc<Reporter>,
}

impl Session {
    pub fn open(config: &Config, offline: bool) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        let connectivity: Arc<dyn Connectivity> = if offline {
            Arc::new(StaticConnectivity::offline())
        } else {
            let probe = TcpProbe::for_url(config.endpoints().base(), config.delivery.timeout())?;
            let probed = ProbedConnectivity::new(probe);
            probed.refresh();
            Arc::new(probed)
        };
        let host = NotifyHost::new();
        let wake = host.handle();
        let reporter = Arc::new(Reporter::default());

        let client = ToucanClient::new(
            config,
            Collaborators {
                prefs: Arc::new(FilePreferences::open(&config.prefs_path())?),
                connectivity: Arc::clone(&connectivity),
                host: Arc::new(host),
                transport: Arc::new(ReqwestTransport::new(config.api_token.clone(), config.delivery.timeout())?),
                callbacks: CallbackRegistry::with_fallback(reporter.clone()),
                runtime: runtime.handle().clone(),
            },
        )?;
        tracing::debug!(device = client.device_id(), "session opened");

        Ok(Session { runtime, client, connectivity, wake, reporter })
    }

    /// Runs one client call, then waits for it if it was dispatched.
    pub fn send(&self, call: impl FnOnce(&ToucanClient) -> Result<Submission>) -> Result<()> {
        match call(&self.client)? {
            Submission::Queued(id) => println!("queued {}", id),
            Submission::Dispatched(id) => tracing::debug!(job = %id, "dispatched"),
        }
        self.runtime.block_on(self.client.wait_idle());
        match self.reporter.take_failure() {
            Some(e) => Err(Error::Transport(e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

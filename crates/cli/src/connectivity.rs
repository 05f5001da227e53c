// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity state.
//!
//! The client asks [`Connectivity::is_online`] before every call: online
//! calls are dispatched immediately, offline calls are persisted for the
//! delivery driver. `is_online` must answer from memory. Anything that
//! touches the network belongs in [`Connectivity::refresh`], which the
//! delivery loop runs on a blocking thread. The answer only has to be a good
//! guess; a wrong "online" surfaces as a transport failure on the callback.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};

/// Reports whether the backend is likely reachable.
pub trait Connectivity: Send + Sync {
    /// Last known state. Never blocks.
    fn is_online(&self) -> bool;

    /// Re-checks reachability and returns the new state. May block.
    fn refresh(&self) -> bool {
        self.is_online()
    }
}

/// Checks reachability with a TCP connect to the backend host. Blocking.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        TcpProbe { host: host.into(), port, timeout }
    }

    /// Probe for the host and port of a base URL.
    pub fn for_url(url: &str, timeout: Duration) -> Result<Self> {
        let parsed = reqwest::Url::parse(url).map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", url, e)))?;
        let host = parsed.host_str().ok_or_else(|| Error::Config(format!("endpoint '{}' has no host", url)))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| Error::Config(format!("endpoint '{}' has no port", url)))?;
        Ok(Self::new(host, port, timeout))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn addrs(&self) -> Vec<SocketAddr> {
        match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                tracing::debug!(host = %self.host, "resolve failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Resolves the host and tries each address until one connects.
    pub fn probe(&self) -> bool {
        self.addrs().iter().any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok())
    }
}

/// Cached result of a [`TcpProbe`], refreshed off the caller's thread.
#[derive(Debug)]
pub struct ProbedConnectivity {
    probe: TcpProbe,
    online: AtomicBool,
}

impl ProbedConnectivity {
    /// Starts offline until the first [`refresh`](Connectivity::refresh).
    pub fn new(probe: TcpProbe) -> Self {
        ProbedConnectivity { probe, online: AtomicBool::new(false) }
    }
}

impl Connectivity for ProbedConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    fn refresh(&self) -> bool {
        let online = self.probe.probe();
        if self.online.swap(online, Ordering::AcqRel) != online {
            tracing::info!(host = %self.probe.host, online, "connectivity changed");
        }
        online
    }
}

/// Fixed answer, switchable at runtime. Used for `--offline` and tests.
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        StaticConnectivity { online: AtomicBool::new(online) }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }
}

impl Connectivity for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;

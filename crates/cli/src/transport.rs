// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport abstraction.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTPS calls through reqwest for production
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use toucan_core::JobRequest;

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The HTTP client could not be built.
    #[error("client build failed: {0}")]
    ClientBuild(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Performs one HTTP call for a job request and returns the response body.
pub trait HttpTransport: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: &'a JobRequest,
        skip_tls_verify: bool,
    ) -> Pin<Box<dyn Future<Output = TransportResult<String>> + Send + 'a>>;
}

/// reqwest-backed transport.
///
/// Every call carries the API token as a bearer credential. Jobs that opt
/// out of certificate checks use a second client that is only built the
/// first time such a job runs.
pub struct ReqwestTransport {
    api_token: String,
    timeout: Duration,
    client: Client,
    permissive: Mutex<Option<Client>>,
}

impl ReqwestTransport {
    pub fn new(api_token: impl Into<String>, timeout: Duration) -> TransportResult<Self> {
        let client = build_client(timeout, false)?;
        Ok(ReqwestTransport { api_token: api_token.into(), timeout, client, permissive: Mutex::new(None) })
    }

    fn client_for(&self, skip_tls_verify: bool) -> TransportResult<Client> {
        if !skip_tls_verify {
            return Ok(self.client.clone());
        }
        let mut permissive = self.permissive.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = permissive.as_ref() {
            return Ok(client.clone());
        }
        tracing::warn!("building client without TLS certificate verification");
        let client = build_client(self.timeout, true)?;
        *permissive = Some(client.clone());
        Ok(client)
    }
}

fn build_client(timeout: Duration, skip_tls_verify: bool) -> TransportResult<Client> {
    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .danger_accept_invalid_certs(skip_tls_verify)
        .build()
        .map_err(|e| TransportError::ClientBuild(e.to_string()))
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        request: &'a JobRequest,
        skip_tls_verify: bool,
    ) -> Pin<Box<dyn Future<Output = TransportResult<String>> + Send + 'a>> {
        Box::pin(async move {
            let client = self.client_for(skip_tls_verify)?;
            let builder = match request {
                JobRequest::Get { url } => client.get(url),
                JobRequest::Post { endpoint, content_type, body } => {
                    let content_type = HeaderValue::from_str(content_type)
                        .map_err(|e| TransportError::Request(format!("invalid content type: {}", e)))?;
                    client.post(endpoint).header(CONTENT_TYPE, content_type).body(body.clone())
                }
            };

            let response = builder
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            let status = response.status();
            let body = response.text().await.map_err(|e| TransportError::Request(e.to_string()))?;
            if !status.is_success() {
                return Err(TransportError::Status { code: status.as_u16(), body });
            }
            Ok(body)
        })
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for client tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use toucan_core::{JobRequest, Method};

use crate::callback::{Completion, ResponseCallback};
use crate::config::Config;
use crate::error::Result;
use crate::prefs::Preferences;
use crate::transport::{HttpTransport, TransportError, TransportResult};

/// One call seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub skip_tls_verify: bool,
}

/// Mock transport for testing without real sockets.
///
/// Answers with scripted results in order, then `Ok("OK")`.
#[derive(Clone, Default)]
pub struct MockTransport {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    responses: Arc<Mutex<VecDeque<TransportResult<String>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next call.
    pub fn push_response(&self, result: TransportResult<String>) {
        self.responses.lock().unwrap().push_back(result);
    }

    /// Make the next `n` calls fail with HTTP 503.
    pub fn fail_next(&self, n: usize) {
        for _ in 0..n {
            self.push_response(Err(TransportError::Status { code: 503, body: "unavailable".into() }));
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpTransport for MockTransport {
    fn execute<'a>(
        &'a self,
        request: &'a JobRequest,
        skip_tls_verify: bool,
    ) -> Pin<Box<dyn Future<Output = TransportResult<String>> + Send + 'a>> {
        Box::pin(async move {
            let body = match request {
                JobRequest::Get { .. } => None,
                JobRequest::Post { body, .. } => Some(body.clone()),
            };
            self.calls.lock().unwrap().push(RecordedCall {
                method: request.method(),
                url: request.url().to_string(),
                body,
                skip_tls_verify,
            });
            self.responses.lock().unwrap().pop_front().unwrap_or_else(|| Ok("OK".to_string()))
        })
    }
}

/// Collects every completion it receives.
#[derive(Default)]
pub struct RecordingCallback {
    pub completions: Mutex<Vec<Completion>>,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn completions(&self) -> Vec<Completion> {
        self.completions.lock().unwrap().clone()
    }
}

impl ResponseCallback for RecordingCallback {
    fn on_response(&self, completion: &Completion) {
        self.completions.lock().unwrap().push(completion.clone());
    }
}

/// In-memory preferences.
#[derive(Default)]
pub struct MemoryPreferences {
    device_id: Mutex<Option<String>>,
    token: Mutex<Option<String>>,
}

impl MemoryPreferences {
    pub fn with_device_id(id: &str) -> Self {
        MemoryPreferences { device_id: Mutex::new(Some(id.to_string())), token: Mutex::new(None) }
    }
}

impl Preferences for MemoryPreferences {
    fn device_id(&self) -> Option<String> {
        self.device_id.lock().unwrap().clone()
    }

    fn set_device_id(&self, id: &str) -> Result<()> {
        *self.device_id.lock().unwrap() = Some(id.to_string());
        Ok(())
    }

    fn notification_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn set_notification_token(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }
}

/// Config with `PK`/`AT` credentials and state under `dir`.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::new("AT", "PK");
    config.endpoint = Some("https://push.test".to_string());
    config.state_dir = Some(dir.to_path_buf());
    config.delivery.initial_backoff_ms = 100;
    config.delivery.max_attempts = 3;
    config
}

/// Raw HTTP request captured by [`spawn_http_server`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Serves `count` connections on localhost, answering each with `status`
/// and `body`. Returns the base URL and the captured requests.
pub async fn spawn_http_server(status: u16, body: &'static str, count: usize) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    tokio::spawn(async move {
        for _ in 0..count {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let head_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break buf.len();
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            while buf.len() < head_end + length {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let req_body = String::from_utf8_lossy(&buf[head_end..]).to_string();
            sink.lock().unwrap().push(CapturedRequest { head, body: req_body });

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    (url, captured)
}

/// Clock the test moves by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: std::sync::atomic::AtomicU64,
}

impl ManualClock {
    pub fn at(now_ms: u64) -> Arc<Self> {
        Arc::new(ManualClock { now_ms: std::sync::atomic::AtomicU64::new(now_ms) })
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

impl toucan_core::ClockSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(std::sync::atomic::Ordering::SeqCst)
    }
}

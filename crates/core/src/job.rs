// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The durable job envelope.
//!
//! A [`Job`] holds everything needed to perform one call later, possibly
//! in another process: the operation, the fully built request, the TLS
//! bypass flag, and delivery bookkeeping. Requests are signed before a job
//! exists, so a job never carries an unsigned payload.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::job_id::JobId;
use crate::operation::{Method, Operation};
use crate::request::SignedRequest;

/// Content type of every POST body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The call a job performs, discriminated by HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum JobRequest {
    #[serde(rename = "GET")]
    Get { url: String },
    #[serde(rename = "POST")]
    Post {
        endpoint: String,
        content_type: String,
        body: String,
    },
}

impl JobRequest {
    pub fn method(&self) -> Method {
        match self {
            JobRequest::Get { .. } => Method::Get,
            JobRequest::Post { .. } => Method::Post,
        }
    }

    /// Target URL, including the query for GET.
    pub fn url(&self) -> &str {
        match self {
            JobRequest::Get { url } => url,
            JobRequest::Post { endpoint, .. } => endpoint,
        }
    }
}

/// One durable unit of outbound work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub operation: Operation,
    #[serde(default)]
    pub skip_tls_verify: bool,
    pub request: JobRequest,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Job {
    /// A GET job for an already encoded URL.
    pub fn get(id: JobId, operation: Operation, url: impl Into<String>, skip_tls_verify: bool) -> Self {
        Job::new(id, operation, JobRequest::Get { url: url.into() }, skip_tls_verify)
    }

    /// A POST job carrying the JSON encoding of a signed request.
    pub fn post<R: SignedRequest>(
        id: JobId,
        operation: Operation,
        endpoint: impl Into<String>,
        request: &R,
        skip_tls_verify: bool,
    ) -> Result<Self> {
        if !request.is_signed() {
            return Err(Error::Unsigned { operation });
        }
        let body = serde_json::to_string(request)?;
        let request = JobRequest::Post {
            endpoint: endpoint.into(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            body,
        };
        Ok(Job::new(id, operation, request, skip_tls_verify))
    }

    fn new(id: JobId, operation: Operation, request: JobRequest, skip_tls_verify: bool) -> Self {
        Job { id, operation, skip_tls_verify, request, attempts: 0, not_before_ms: None, last_error: None }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a cached job, rejecting ids that disagree with the operation.
    pub fn decode(s: &str) -> Result<Self> {
        let job: Job = serde_json::from_str(s)?;
        let id_op = job.id.operation()?;
        if id_op != job.operation {
            return Err(Error::InvalidJob(format!("job {} is tagged {}", job.id, job.operation)));
        }
        if job.request.method() != job.operation.method() {
            return Err(Error::InvalidJob(format!(
                "job {} uses {} but {} expects {}",
                job.id,
                job.request.method(),
                job.operation,
                job.operation.method()
            )));
        }
        Ok(job)
    }

    /// Records a failed attempt and defers the next one.
    pub fn record_failure(&mut self, error: impl Into<String>, retry_at_ms: u64) {
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(error.into());
        self.not_before_ms = Some(retry_at_ms);
    }

    /// True when the job may be attempted at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.not_before_ms.is_none_or(|t| t <= now_ms)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

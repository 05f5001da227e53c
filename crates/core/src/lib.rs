// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! toucan-core: shared types for the toucan push-notification client
//!
//! This crate provides the operations, endpoint routing, request signing,
//! and the durable job envelope used by the toucan client and its delivery
//! driver. It performs no I/O.

pub mod digest;
pub mod endpoint;
pub mod error;
pub mod job;
pub mod job_id;
pub mod operation;
pub mod request;
pub mod signing;

#[cfg(test)]
mod test_helpers;

pub use digest::{DigestAlgorithm, DigestError, Digester, Sha1Digester, Sha256Digester};
pub use endpoint::{Endpoints, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use job::{Job, JobRequest, JSON_CONTENT_TYPE};
pub use job_id::{ClockSource, JobId, JobIdGenerator, SystemClock};
pub use operation::{Method, Operation};
pub use request::{
    AckRequest, DeviceQuery, DeviceRegistrationRecord, DeviceRegistrationRequest, NotificationRef, SignedRequest,
    TagsRequest,
};
pub use signing::Signer;

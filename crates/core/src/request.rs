// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed, self-verifying request payloads.
//!
//! Each request is built and signed in one step. Optional registration
//! fields set afterwards (`with_*`) re-sign the request, so the payload
//! signature always covers the fields that are actually sent.
//!
//! Field names follow the backend's camelCase JSON; unset fields are
//! omitted from the body.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::signing::{canonical, field, Signer};

/// A request whose payload is covered by `hashSignature`.
pub trait SignedRequest: Serialize {
    /// Canonical rendering of the signed fields.
    fn data_string(&self) -> String;

    fn app_hash_signature(&self) -> Option<&str>;

    fn hash_signature(&self) -> Option<&str>;

    /// True when both signatures are present and the request may be sent.
    fn is_signed(&self) -> bool {
        self.app_hash_signature().is_some() && self.hash_signature().is_some()
    }
}

/// Device and installation details sent on registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistrationRecord {
    pub id: i32,
    pub app_version: i32,
    pub ext_id: i32,
    pub group_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_extra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_res_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_referral: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_creation: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_update: Option<DateTime<Utc>>,
}

impl DeviceRegistrationRecord {
    /// `appVersion;#;extId;#;groupId;#;devId;#;devLocale;#;devOs;#;devExtra;#;devResType;#;installReferral;#;notToken`
    pub fn data_string(&self) -> String {
        let app_version = self.app_version.to_string();
        let ext_id = self.ext_id.to_string();
        let group_id = self.group_id.to_string();
        canonical([
            app_version.as_str(),
            ext_id.as_str(),
            group_id.as_str(),
            field(self.dev_id.as_deref()),
            field(self.dev_locale.as_deref()),
            field(self.dev_os.as_deref()),
            field(self.dev_extra.as_deref()),
            field(self.dev_res_type.as_deref()),
            field(self.install_referral.as_deref()),
            field(self.not_token.as_deref()),
        ])
    }
}

/// Registers (or re-registers) a device for the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistrationRequest {
    app_key: String,
    data: DeviceRegistrationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_hash_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash_signature: Option<String>,
}

impl DeviceRegistrationRequest {
    pub fn build(signer: &Signer, data: DeviceRegistrationRecord) -> Self {
        let mut request = DeviceRegistrationRequest {
            app_key: signer.app_key().to_string(),
            data,
            app_hash_signature: signer.app_hash_signature(),
            hash_signature: None,
        };
        request.resign(signer);
        request
    }

    /// Sets the external (back-end user) id and re-signs.
    pub fn with_external_id(mut self, signer: &Signer, ext_id: i32) -> Self {
        self.data.ext_id = ext_id;
        self.resign(signer);
        self
    }

    /// Sets the external group id and re-signs.
    pub fn with_group_id(mut self, signer: &Signer, group_id: i32) -> Self {
        self.data.group_id = group_id;
        self.resign(signer);
        self
    }

    /// Sets the install referral and re-signs.
    pub fn with_install_referral(mut self, signer: &Signer, referral: impl Into<String>) -> Self {
        self.data.install_referral = Some(referral.into());
        self.resign(signer);
        self
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn data(&self) -> &DeviceRegistrationRecord {
        &self.data
    }

    fn resign(&mut self, signer: &Signer) {
        self.hash_signature = signer.hash_signature(&self.data.data_string());
    }
}

impl SignedRequest for DeviceRegistrationRequest {
    fn data_string(&self) -> String {
        self.data.data_string()
    }

    fn app_hash_signature(&self) -> Option<&str> {
        self.app_hash_signature.as_deref()
    }

    fn hash_signature(&self) -> Option<&str> {
        self.hash_signature.as_deref()
    }
}

/// Reports that a notification was received or read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckRequest {
    app_key: String,
    dev_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    n_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n_ref: Option<String>,
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_hash_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash_signature: Option<String>,
}

impl AckRequest {
    pub fn build(
        signer: &Signer,
        dev_id: impl Into<String>,
        notification: &NotificationRef,
        token: impl Into<String>,
    ) -> Self {
        let mut request = AckRequest {
            app_key: signer.app_key().to_string(),
            dev_id: dev_id.into(),
            n_id: notification.id.clone(),
            n_ref: notification.reference.clone(),
            token: token.into(),
            app_hash_signature: signer.app_hash_signature(),
            hash_signature: None,
        };
        request.hash_signature = signer.hash_signature(&request.data_string());
        request
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl SignedRequest for AckRequest {
    /// `nId;#;nRef;#;token`
    fn data_string(&self) -> String {
        canonical([
            field(self.n_id.as_deref()),
            field(self.n_ref.as_deref()),
            field(Some(self.token.as_str())),
        ])
    }

    fn app_hash_signature(&self) -> Option<&str> {
        self.app_hash_signature.as_deref()
    }

    fn hash_signature(&self) -> Option<&str> {
        self.hash_signature.as_deref()
    }
}

/// Identifies a received notification (the `nId` and `nRef` keys of its payload).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRef {
    #[serde(rename = "nId")]
    pub id: Option<String>,
    #[serde(rename = "nRef")]
    pub reference: Option<String>,
}

impl NotificationRef {
    pub fn new(id: impl Into<String>, reference: impl Into<String>) -> Self {
        NotificationRef {
            id: Some(id.into()),
            reference: Some(reference.into()),
        }
    }
}

/// Adds, removes, or resets tags for the application/device pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsRequest {
    app_key: String,
    dev_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_hash_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash_signature: Option<String>,
    tags: Vec<String>,
}

impl TagsRequest {
    pub fn build(signer: &Signer, dev_id: impl Into<String>, tags: Vec<String>) -> Self {
        let mut request = TagsRequest {
            app_key: signer.app_key().to_string(),
            dev_id: dev_id.into(),
            app_hash_signature: signer.app_hash_signature(),
            hash_signature: None,
            tags,
        };
        request.hash_signature = signer.hash_signature(&request.data_string());
        request
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn dev_id(&self) -> &str {
        &self.dev_id
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl SignedRequest for TagsRequest {
    /// Tags joined in order; empty list renders as the empty string.
    fn data_string(&self) -> String {
        canonical(&self.tags)
    }

    fn app_hash_signature(&self) -> Option<&str> {
        self.app_hash_signature.as_deref()
    }

    fn hash_signature(&self) -> Option<&str> {
        self.hash_signature.as_deref()
    }
}

/// Line length of the MIME-style base64 the backend decodes.
const BASE64_LINE_LEN: usize = 76;

/// Standard base64 broken into 76-character lines, each ending in `\n`.
fn base64_lines(data: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(data);
    let mut out = String::with_capacity(b64.len() + b64.len() / BASE64_LINE_LEN + 1);
    for (i, c) in b64.chars().enumerate() {
        if i > 0 && i % BASE64_LINE_LEN == 0 {
            out.push('\n');
        }
        out.push(c);
    }
    if !b64.is_empty() {
        out.push('\n');
    }
    out
}

/// Device-scoped GET parameters (unregister, enable, list tags).
///
/// Encoded as `dUId=..&appPubKey=..&appHashSignature=..`, base64'd in
/// 76-character lines with a trailing newline, then form-URL-encoded into a
/// single query value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceQuery {
    dev_id: String,
    app_key: String,
    app_hash_signature: Option<String>,
}

impl DeviceQuery {
    pub fn build(signer: &Signer, dev_id: impl Into<String>) -> Self {
        DeviceQuery {
            dev_id: dev_id.into(),
            app_key: signer.app_key().to_string(),
            app_hash_signature: signer.app_hash_signature(),
        }
    }

    pub fn is_signed(&self) -> bool {
        self.app_hash_signature.is_some()
    }

    /// Plain `key=value&...` parameter string.
    pub fn params(&self) -> Option<String> {
        let sig = self.app_hash_signature.as_deref()?;
        Some(format!(
            "dUId={}&appPubKey={}&appHashSignature={}",
            self.dev_id, self.app_key, sig
        ))
    }

    /// Encoded query value: URL-encoded line-wrapped base64 of
    /// [`params`](Self::params).
    pub fn encoded(&self) -> Option<String> {
        let b64 = base64_lines(self.params()?.as_bytes());
        Some(form_urlencoded::byte_serialize(b64.as_bytes()).collect())
    }

    /// Full GET URL: `<endpoint>=<encoded>`.
    pub fn url(&self, operation: Operation, endpoint: &str) -> Result<String> {
        let encoded = self.encoded().ok_or(Error::Unsigned { operation })?;
        Ok(format!("{}={}", endpoint, encoded))
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

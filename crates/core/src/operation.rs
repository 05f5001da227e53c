// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! High-level API operations and their wire routing.
//!
//! Every call the client makes is one [`Operation`]. The operation fixes the
//! HTTP method, the endpoint path, and the query discriminator, and its wire
//! name prefixes the job id of any job created for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const API_PATH: &str = "/PushNOTApi/NOTPushApi";
const ACK_PATH: &str = "/PushNOTApi/ackreport";

/// HTTP method used by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation against the notification backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "DeviceRegistration")]
    DeviceRegistration,
    #[serde(rename = "DeviceUnRegistration")]
    DeviceUnregistration,
    #[serde(rename = "DeviceEnableRegistered")]
    DeviceEnable,
    #[serde(rename = "InformReferral")]
    InformReferral,
    #[serde(rename = "AddTags")]
    AddTags,
    #[serde(rename = "RemoveTags")]
    RemoveTags,
    #[serde(rename = "ListTags")]
    ListTags,
    #[serde(rename = "ResetTags")]
    ResetTags,
    #[serde(rename = "NotificationReceivedACK")]
    AckReceived,
    #[serde(rename = "NotificationReadACK")]
    AckRead,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Operation; 10] = [
        Operation::DeviceRegistration,
        Operation::DeviceUnregistration,
        Operation::DeviceEnable,
        Operation::InformReferral,
        Operation::AddTags,
        Operation::RemoveTags,
        Operation::ListTags,
        Operation::ResetTags,
        Operation::AckReceived,
        Operation::AckRead,
    ];

    /// Wire name, also used as the job id prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::DeviceRegistration => "DeviceRegistration",
            Operation::DeviceUnregistration => "DeviceUnRegistration",
            Operation::DeviceEnable => "DeviceEnableRegistered",
            Operation::InformReferral => "InformReferral",
            Operation::AddTags => "AddTags",
            Operation::RemoveTags => "RemoveTags",
            Operation::ListTags => "ListTags",
            Operation::ResetTags => "ResetTags",
            Operation::AckReceived => "NotificationReceivedACK",
            Operation::AckRead => "NotificationReadACK",
        }
    }

    /// HTTP method used to deliver this operation.
    pub fn method(&self) -> Method {
        match self {
            Operation::DeviceUnregistration | Operation::DeviceEnable | Operation::ListTags => {
                Method::Get
            }
            _ => Method::Post,
        }
    }

    /// Endpoint path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Operation::AckReceived | Operation::AckRead => ACK_PATH,
            _ => API_PATH,
        }
    }

    /// Query discriminator appended to the path, including the leading `?`.
    pub fn query(&self) -> &'static str {
        match self {
            // Referral is reported through a registration call.
            Operation::DeviceRegistration | Operation::InformReferral => "?dr",
            Operation::DeviceUnregistration => "?du",
            Operation::DeviceEnable => "?de",
            Operation::AddTags => "?dta",
            Operation::RemoveTags => "?dtr",
            Operation::ListTags => "?dtl",
            Operation::ResetTags => "?dtrs",
            Operation::AckReceived => "?op=2",
            Operation::AckRead => "?op=1",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::InvalidOperation(s.to_string()))
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;

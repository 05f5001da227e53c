// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::digest::Sha1Digester;
use crate::test_helpers::{echo_signer, failing_signer};
use std::sync::Arc;
use yare::parameterized;

fn record() -> DeviceRegistrationRecord {
    DeviceRegistrationRecord {
        app_version: 3,
        dev_id: Some("D1".into()),
        dev_locale: Some("es_ES".into()),
        dev_os: Some("android".into()),
        not_token: Some("TOK1".into()),
        ..Default::default()
    }
}

#[test]
fn registration_data_string_orders_fields() {
    assert_eq!(
        record().data_string(),
        "3;#;0;#;0;#;D1;#;es_ES;#;android;#;NONE;#;NONE;#;NONE;#;TOK1"
    );
}

#[test]
fn registration_data_string_renders_empty_as_sentinel() {
    let mut rec = record();
    rec.dev_extra = Some(String::new());
    assert!(rec.data_string().contains(";#;android;#;NONE;#;"));
}

#[test]
fn registration_is_signed_over_data_string() {
    let signer = echo_signer();
    let req = DeviceRegistrationRequest::build(&signer, record());

    assert!(req.is_signed());
    assert_eq!(req.app_hash_signature(), Some("<PKAT>"));
    assert_eq!(
        req.hash_signature().unwrap(),
        format!("<PK/{}>", req.data_string())
    );
}

#[test]
fn with_external_id_resigns() {
    let signer = echo_signer();
    let req = DeviceRegistrationRequest::build(&signer, record());
    let before = req.hash_signature().unwrap().to_string();

    let req = req.with_external_id(&signer, 42);

    assert_eq!(req.data().ext_id, 42);
    assert_ne!(req.hash_signature().unwrap(), before);
    assert_eq!(
        req.hash_signature().unwrap(),
        format!("<PK/{}>", req.data_string())
    );
}

#[test]
fn with_group_id_and_referral_resign() {
    let signer = echo_signer();
    let req = DeviceRegistrationRequest::build(&signer, record())
        .with_group_id(&signer, 7)
        .with_install_referral(&signer, "utm_source=x");

    let data = req.data_string();
    assert!(data.starts_with("3;#;0;#;7;#;"));
    assert!(data.contains(";#;utm_source=x;#;"));
    assert_eq!(req.hash_signature().unwrap(), format!("<PK/{}>", data));
}

#[test]
fn registration_json_uses_camel_case_and_omits_unset() {
    let req = DeviceRegistrationRequest::build(&echo_signer(), record());
    let json: serde_json::Value = serde_json::to_value(&req).unwrap();

    assert_eq!(json["appKey"], "PK");
    assert_eq!(json["appHashSignature"], "<PKAT>");
    assert_eq!(json["data"]["notToken"], "TOK1");
    assert_eq!(json["data"]["appVersion"], 3);
    assert!(json["data"].get("devExtra").is_none());
    assert!(json["data"].get("tsCreation").is_none());
}

#[test]
fn failed_digest_leaves_request_unsigned() {
    let req = DeviceRegistrationRequest::build(&failing_signer(), record());
    assert!(!req.is_signed());

    let json: serde_json::Value = serde_json::to_value(&req).unwrap();
    assert!(json.get("hashSignature").is_none());
}

#[test]
fn ack_signed_over_notification_fields() {
    let req = AckRequest::build(
        &echo_signer(),
        "D1",
        &NotificationRef::new("17", "ref-a"),
        "TOK1",
    );

    assert_eq!(req.data_string(), "17;#;ref-a;#;TOK1");
    assert_eq!(req.hash_signature(), Some("<PK/17;#;ref-a;#;TOK1>"));

    let json: serde_json::Value = serde_json::to_value(&req).unwrap();
    assert_eq!(json["nId"], "17");
    assert_eq!(json["nRef"], "ref-a");
    assert_eq!(json["token"], "TOK1");
    assert_eq!(json["devId"], "D1");
}

#[test]
fn ack_missing_reference_renders_sentinel() {
    let notification = NotificationRef {
        id: Some("17".into()),
        reference: None,
    };
    let req = AckRequest::build(&echo_signer(), "D1", &notification, "TOK1");
    assert_eq!(req.data_string(), "17;#;NONE;#;TOK1");
}

#[parameterized(
    empty = { &[], "" },
    single = { &["vip"], "vip" },
    ordered = { &["b", "a"], "b;#;a" },
)]
fn tags_data_string(tags: &[&str], expected: &str) {
    let tags = tags.iter().map(|t| t.to_string()).collect();
    let req = TagsRequest::build(&echo_signer(), "D1", tags);
    assert_eq!(req.data_string(), expected);
    assert_eq!(req.hash_signature().unwrap(), format!("<PK/{}>", expected));
}

#[test]
fn add_and_reset_tags_sign_differently() {
    let signer = Signer::new("PK", "AT", Arc::new(Sha1Digester));
    let add = TagsRequest::build(&signer, "D1", vec!["a".into(), "b".into()]);
    let reset = TagsRequest::build(&signer, "D1", vec![]);

    assert_eq!(add.app_hash_signature(), reset.app_hash_signature());
    assert_ne!(add.hash_signature(), reset.hash_signature());
}

#[test]
fn device_query_params_are_plain_before_encoding() {
    let query = DeviceQuery::build(&echo_signer(), "D1");
    assert_eq!(
        query.params().unwrap(),
        "dUId=D1&appPubKey=PK&appHashSignature=<PKAT>"
    );
}

#[test]
fn device_query_url_is_urlencoded_base64() {
    let query = DeviceQuery::build(&echo_signer(), "D1");
    let url = query
        .url(Operation::DeviceUnregistration, "https://h/PushNOTApi/NOTPushApi?du")
        .unwrap();

    let (prefix, value) = url.split_once("?du=").unwrap();
    assert_eq!(prefix, "https://h/PushNOTApi/NOTPushApi");

    let b64: String = form_urlencoded::parse(format!("v={}", value).as_bytes())
        .next()
        .unwrap()
        .1
        .into_owned();
    assert!(value.ends_with("%0A"));
    assert!(b64.ends_with('\n'));
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(b64.trim_end())
        .unwrap();
    assert_eq!(
        String::from_utf8(decoded).unwrap(),
        "dUId=D1&appPubKey=PK&appHashSignature=<PKAT>"
    );
}

#[test]
fn base64_lines_wrap_at_76_with_trailing_newline() {
    let data = [7u8; 100];
    let wrapped = base64_lines(&data);
    let lines: Vec<&str> = wrapped.split_terminator('\n').collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].len(), 76);
    assert_eq!(lines[1].len(), 60);
    assert!(wrapped.ends_with('\n'));
    assert!(!wrapped.ends_with("\n\n"));

    let joined: String = lines.concat();
    assert_eq!(base64::engine::general_purpose::STANDARD.decode(joined).unwrap(), data);
}

#[test]
fn base64_lines_exact_multiple_has_single_newline() {
    let wrapped = base64_lines(&[1u8; 57]);
    assert_eq!(wrapped.len(), 77);
    assert!(wrapped.ends_with('\n'));
    assert_eq!(wrapped.matches('\n').count(), 1);
}

#[test]
fn unsigned_device_query_has_no_url() {
    let query = DeviceQuery::build(&failing_signer(), "D1");
    assert!(!query.is_signed());

    let err = query
        .url(Operation::ListTags, "https://h/PushNOTApi/NOTPushApi?dtl")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Unsigned {
            operation: Operation::ListTags
        }
    ));
}

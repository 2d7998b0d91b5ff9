// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn start_serializes_with_snake_case_tag() {
    let json = serde_json::to_value(Request::Start {
        bucket: "data".into(),
        region: None,
        access_key_id: None,
        secret_access_key: None,
        vnc_password: None,
        user_id: None,
    })
    .unwrap();
    assert_eq!(json["type"], "start");
    assert_eq!(json["bucket"], "data");
    assert!(json.get("region").is_none(), "absent options are omitted");
}

#[test]
fn list_paging_fields_stay_raw_strings() {
    let request: Request = serde_json::from_str(
        r#"{"type": "list", "status": "running", "limit": "25", "offset": "abc"}"#,
    )
    .unwrap();
    match request {
        Request::List { status, limit, offset } => {
            assert_eq!(status.as_deref(), Some("running"));
            assert_eq!(limit.as_deref(), Some("25"));
            // Not rejected here; the daemon owns validation.
            assert_eq!(offset.as_deref(), Some("abc"));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn unit_variants_round_trip() {
    for request in [Request::Ping, Request::PoolStatus, Request::Shutdown] {
        let json = serde_json::to_string(&request).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}

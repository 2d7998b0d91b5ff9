// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    invalid_input = { ErrorKind::InvalidInput, 400 },
    invalid_bucket = { ErrorKind::InvalidBucket, 400 },
    not_found = { ErrorKind::NotFound, 404 },
    resource_exhausted = { ErrorKind::ResourceExhausted, 503 },
    launch_failed = { ErrorKind::LaunchFailed, 500 },
    attach_failed = { ErrorKind::AttachFailed, 500 },
    store_unavailable = { ErrorKind::StoreUnavailable, 500 },
)]
fn http_status_mapping_is_fixed(kind: ErrorKind, status: u16) {
    assert_eq!(kind.http_status(), status);
}

#[test]
fn kind_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorKind::ResourceExhausted).unwrap();
    assert_eq!(json, "\"resource_exhausted\"");
    let back: ErrorKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ErrorKind::ResourceExhausted);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "my-bucket" },
    dotted = { "logs.us-east-1.example" },
    digits = { "bucket123" },
    min_len = { "abc" },
    max_len = { "a23456789012345678901234567890123456789012345678901234567890123" },
)]
fn accepts_valid_names(name: &str) {
    assert_eq!(validate_bucket_name(name), Ok(()), "{name:?} should pass");
}

#[parameterized(
    too_short = { "ab" },
    too_long = { "a234567890123456789012345678901234567890123456789012345678901234" },
    uppercase = { "MyBucket" },
    underscore = { "my_bucket" },
    leading_dot = { ".bucket" },
    trailing_dot = { "bucket." },
    leading_hyphen = { "-bucket" },
    trailing_hyphen = { "bucket-" },
    space = { "my bucket" },
)]
fn rejects_invalid_names(name: &str) {
    assert!(validate_bucket_name(name).is_err(), "{name:?} should fail");
}

#[test]
fn dummy_credentials_require_both_halves() {
    assert!(is_dummy_credentials("dummy", "dummy"));
    assert!(!is_dummy_credentials("dummy", "real-secret"));
    assert!(!is_dummy_credentials("AKIA123", "dummy"));
    assert!(!is_dummy_credentials("", ""));
}

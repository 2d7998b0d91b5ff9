// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket name syntax validation.
//!
//! Syntax-only; whether the bucket actually exists and is reachable with the
//! supplied credentials is the accessibility validator's concern (adapters
//! crate). The rules here mirror S3-style naming: 3–63 characters, lowercase
//! alphanumerics plus `.` and `-`, not starting or ending with `.` or `-`.

use thiserror::Error;

/// The literal credential pair test environments use to skip remote
/// verification.
pub const DUMMY_CREDENTIAL: &str = "dummy";

/// Validation failure for a bucket name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BucketNameError {
    #[error("bucket name must be 3-63 characters, got {0}")]
    Length(usize),
    #[error("bucket name contains invalid character {0:?}")]
    InvalidChar(char),
    #[error("bucket name cannot start or end with '.' or '-'")]
    EdgePunctuation,
}

/// Check bucket name syntax.
pub fn validate_bucket_name(name: &str) -> Result<(), BucketNameError> {
    if name.len() < 3 || name.len() > 63 {
        return Err(BucketNameError::Length(name.len()));
    }
    for c in name.chars() {
        let ok = c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-';
        if !ok {
            return Err(BucketNameError::InvalidChar(c));
        }
    }
    let first = name.chars().next();
    let last = name.chars().last();
    if matches!(first, Some('.') | Some('-')) || matches!(last, Some('.') | Some('-')) {
        return Err(BucketNameError::EdgePunctuation);
    }
    Ok(())
}

/// Whether the supplied credentials are the explicit test-environment opt-out
/// that bypasses remote accessibility verification.
pub fn is_dummy_credentials(access_key_id: &str, secret_access_key: &str) -> bool {
    access_key_id == DUMMY_CREDENTIAL && secret_access_key == DUMMY_CREDENTIAL
}

#[cfg(test)]
#[path = "bucket_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket accessibility validation at the object-storage boundary.
//!
//! Syntax is checked in core; this adapter answers "does the bucket exist
//! and where". The S3 implementation uses an unauthenticated HEAD against
//! the bucket's virtual-host endpoint: a 301 carries the bucket's actual
//! region in `x-amz-bucket-region`, a 404 means the bucket does not exist,
//! and 200/403 both confirm existence. The literal `dummy`/`dummy`
//! credential pair skips the remote call entirely (test-environment opt-in).

use async_trait::async_trait;
use thiserror::Error;

use idepool_core::{is_dummy_credentials, Credentials};

/// Successful validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCheck {
    /// Region the bucket actually lives in; callers prefer this over the
    /// requested region when they differ.
    pub region: String,
}

/// Validation failure.
#[derive(Debug, Error)]
pub enum BucketAccessError {
    #[error("bucket not found: {0}")]
    NotFound(String),
    #[error("bucket not accessible: {0}")]
    Unreachable(String),
}

/// Boundary check for bucket accessibility.
#[async_trait]
pub trait BucketValidator: Send + Sync {
    async fn verify(
        &self,
        bucket: &str,
        region: &str,
        credentials: Option<&Credentials>,
    ) -> Result<BucketCheck, BucketAccessError>;
}

/// Validator against the real S3 endpoint.
pub struct S3BucketValidator {
    http: reqwest::Client,
}

impl S3BucketValidator {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            // Builder only fails on TLS backend misconfiguration; fall back
            // to the default client rather than refusing to start.
            .unwrap_or_default();
        Self { http }
    }
}

impl Default for S3BucketValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BucketValidator for S3BucketValidator {
    async fn verify(
        &self,
        bucket: &str,
        region: &str,
        credentials: Option<&Credentials>,
    ) -> Result<BucketCheck, BucketAccessError> {
        if let Some(creds) = credentials {
            if is_dummy_credentials(&creds.access_key_id, &creds.secret_access_key) {
                tracing::debug!(%bucket, "dummy credentials, skipping remote bucket check");
                return Ok(BucketCheck { region: region.to_string() });
            }
        }

        let url = format!("https://{bucket}.s3.{region}.amazonaws.com/");
        let response = self
            .http
            .head(&url)
            .send()
            .await
            .map_err(|e| BucketAccessError::Unreachable(e.to_string()))?;

        match response.status().as_u16() {
            404 => Err(BucketAccessError::NotFound(bucket.to_string())),
            301 | 307 => {
                // Wrong region; the response names the right one.
                let actual = response
                    .headers()
                    .get("x-amz-bucket-region")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or(region)
                    .to_string();
                tracing::debug!(%bucket, requested = region, actual = %actual, "bucket region redirect");
                Ok(BucketCheck { region: actual })
            }
            status if status < 500 => Ok(BucketCheck { region: region.to_string() }),
            status => Err(BucketAccessError::Unreachable(format!("{url} returned {status}"))),
        }
    }
}

/// Fixed-outcome validator for tests.
#[cfg(any(test, feature = "test-support"))]
pub struct StaticBucketValidator {
    outcome: parking_lot::Mutex<Result<Option<String>, String>>,
    calls: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl StaticBucketValidator {
    /// Accept every bucket at its requested region.
    pub fn accepting() -> Self {
        Self { outcome: parking_lot::Mutex::new(Ok(None)), calls: parking_lot::Mutex::new(Vec::new()) }
    }

    /// Accept every bucket but report it living in `region`.
    pub fn redirecting_to(region: &str) -> Self {
        let validator = Self::accepting();
        *validator.outcome.lock() = Ok(Some(region.to_string()));
        validator
    }

    /// Reject every bucket as missing.
    pub fn rejecting() -> Self {
        let validator = Self::accepting();
        *validator.outcome.lock() = Err("bucket rejected by test validator".to_string());
        validator
    }

    pub fn verified_buckets(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl BucketValidator for StaticBucketValidator {
    async fn verify(
        &self,
        bucket: &str,
        region: &str,
        credentials: Option<&Credentials>,
    ) -> Result<BucketCheck, BucketAccessError> {
        if let Some(creds) = credentials {
            if is_dummy_credentials(&creds.access_key_id, &creds.secret_access_key) {
                return Ok(BucketCheck { region: region.to_string() });
            }
        }
        self.calls.lock().push(bucket.to_string());
        match &*self.outcome.lock() {
            Ok(Some(actual)) => Ok(BucketCheck { region: actual.clone() }),
            Ok(None) => Ok(BucketCheck { region: region.to_string() }),
            Err(cause) => Err(BucketAccessError::NotFound(cause.clone())),
        }
    }
}

#[cfg(test)]
#[path = "bucket_tests.rs"]
mod tests;

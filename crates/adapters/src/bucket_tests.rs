// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use idepool_core::Credentials;

fn dummy() -> Credentials {
    Credentials { access_key_id: "dummy".into(), secret_access_key: "dummy".into() }
}

#[tokio::test]
async fn static_validator_accepts_at_requested_region() {
    let validator = StaticBucketValidator::accepting();
    let check = validator.verify("my-bucket", "us-east-1", None).await.unwrap();
    assert_eq!(check.region, "us-east-1");
    assert_eq!(validator.verified_buckets(), vec!["my-bucket"]);
}

#[tokio::test]
async fn redirecting_validator_overrides_region() {
    let validator = StaticBucketValidator::redirecting_to("eu-west-1");
    let check = validator.verify("my-bucket", "us-east-1", None).await.unwrap();
    assert_eq!(check.region, "eu-west-1");
}

#[tokio::test]
async fn rejecting_validator_fails() {
    let validator = StaticBucketValidator::rejecting();
    assert!(validator.verify("my-bucket", "us-east-1", None).await.is_err());
}

#[tokio::test]
async fn dummy_credentials_bypass_even_a_rejecting_validator() {
    let validator = StaticBucketValidator::rejecting();
    let check = validator.verify("my-bucket", "us-east-1", Some(&dummy())).await.unwrap();
    assert_eq!(check.region, "us-east-1");
    assert!(validator.verified_buckets().is_empty(), "remote check must be skipped");
}

#[tokio::test]
async fn real_credentials_do_not_bypass() {
    let validator = StaticBucketValidator::rejecting();
    let creds = Credentials { access_key_id: "AKIA123".into(), secret_access_key: "s3cr3t".into() };
    assert!(validator.verify("my-bucket", "us-east-1", Some(&creds)).await.is_err());
}

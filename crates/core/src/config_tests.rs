// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_documented_values() {
    let cfg = FleetConfig::default();
    assert_eq!(cfg.target_pool_size, 2);
    assert_eq!(cfg.mem_threshold_pct, 90.0);
    assert_eq!(cfg.cpu_threshold_pct, 90.0);
    assert_eq!(cfg.domain, "localhost");
    assert_eq!(cfg.region_default, "us-east-1");
    assert!(cfg.credentials_default.is_none());
    assert_eq!(cfg.loop_periods.queue_secs, 30);
    assert_eq!(cfg.loop_periods.health_secs, 5);
    assert_eq!(cfg.loop_periods.cleanup_secs, 60);
    assert_eq!(cfg.max_consecutive_failures, 3);
    assert_eq!(cfg.readiness_wait_cap_secs, 120);
}

#[test]
fn partial_toml_fills_in_defaults() {
    let cfg = FleetConfig::from_toml(
        r#"
        target_pool_size = 5
        domain = "ide.example.com"

        [loop_periods]
        health_secs = 2
        "#,
    )
    .unwrap();
    assert_eq!(cfg.target_pool_size, 5);
    assert_eq!(cfg.domain, "ide.example.com");
    assert_eq!(cfg.loop_periods.health_secs, 2);
    assert_eq!(cfg.loop_periods.queue_secs, 30);
    assert_eq!(cfg.max_consecutive_failures, 3);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = FleetConfig::from_toml("target_pool_sise = 5");
    assert!(err.is_err(), "typos should not be silently ignored");
}

#[test]
fn credentials_parse_from_table() {
    let cfg = FleetConfig::from_toml(
        r#"
        [credentials_default]
        access_key_id = "AKIAEXAMPLE"
        secret_access_key = "secret"
        "#,
    )
    .unwrap();
    let creds = cfg.credentials_default.unwrap();
    assert_eq!(creds.access_key_id, "AKIAEXAMPLE");
}

#[test]
fn load_or_default_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = FleetConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(cfg, FleetConfig::default());
}

#[test]
fn load_or_default_reads_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(&path, "target_pool_size = 7").unwrap();
    let cfg = FleetConfig::load_or_default(&path).unwrap();
    assert_eq!(cfg.target_pool_size, 7);
}

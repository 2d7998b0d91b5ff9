// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::WorkspaceBuilder;
use yare::parameterized;

#[parameterized(
    starting = { WorkspaceStatus::Starting, "starting" },
    running = { WorkspaceStatus::Running, "running" },
    stopping = { WorkspaceStatus::Stopping, "stopping" },
    stopped = { WorkspaceStatus::Stopped, "stopped" },
    failed = { WorkspaceStatus::Failed, "failed" },
)]
fn status_round_trips_through_str(status: WorkspaceStatus, text: &str) {
    assert_eq!(status.as_str(), text);
    assert_eq!(WorkspaceStatus::parse(text), Some(status));
}

#[test]
fn status_parse_rejects_unknown() {
    assert_eq!(WorkspaceStatus::parse("paused"), None);
}

#[test]
fn only_starting_and_running_are_active() {
    assert!(WorkspaceStatus::Starting.is_active());
    assert!(WorkspaceStatus::Running.is_active());
    assert!(!WorkspaceStatus::Stopping.is_active());
    assert!(!WorkspaceStatus::Stopped.is_active());
    assert!(!WorkspaceStatus::Failed.is_active());
}

#[parameterized(
    inactivity = { ShutdownReason::Inactivity, "inactivity" },
    manual = { ShutdownReason::Manual, "manual" },
    error = { ShutdownReason::Error, "error" },
    resource_limit = { ShutdownReason::ResourceLimit, "resource_limit" },
)]
fn shutdown_reason_round_trips(reason: ShutdownReason, text: &str) {
    assert_eq!(reason.as_str(), text);
    assert_eq!(ShutdownReason::parse(text), Some(reason));
}

#[test]
fn uptime_requires_running_and_started_at() {
    let ws = WorkspaceBuilder::new("abcd1234").build();
    assert_eq!(ws.uptime_secs(10_000), None);

    let ws = WorkspaceBuilder::new("abcd1234")
        .status(WorkspaceStatus::Running)
        .started_at_ms(4_000)
        .build();
    assert_eq!(ws.uptime_secs(10_000), Some(6));
}

#[test]
fn uptime_saturates_on_clock_skew() {
    let ws = WorkspaceBuilder::new("abcd1234")
        .status(WorkspaceStatus::Running)
        .started_at_ms(20_000)
        .build();
    assert_eq!(ws.uptime_secs(10_000), Some(0));
}

#[test]
fn status_serializes_snake_case() {
    let json = serde_json::to_string(&WorkspaceStatus::Starting).unwrap();
    assert_eq!(json, "\"starting\"");
}

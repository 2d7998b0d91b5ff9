// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health scenarios: promotion with startup timing, one-shot editor event,
//! consecutive-failure recovery.

use std::time::Duration;

use idepool_core::{Clock, WorkspaceStatus};
use idepool_engine::{AssignRequest, ProbeOutcome};

use super::support::fleet_with;

#[tokio::test(start_paused = true)]
async fn assigned_workspace_is_promoted_on_the_next_green_tick() {
    let tf = fleet_with(0);
    let requested_at = tf.clock.epoch_ms();

    let assignment = tf
        .fleet
        .assignment
        .assign(AssignRequest { bucket: "test-bucket-1".into(), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(assignment.status, WorkspaceStatus::Starting);

    // The editor comes up 3 wall-clock seconds after the request.
    tf.clock.advance(Duration::from_secs(3));
    tf.fleet.health.tick().await;

    let record = tf.fleet.store.get(&assignment.id).unwrap().unwrap();
    assert_eq!(record.status, WorkspaceStatus::Running);
    assert_eq!(record.started_at_ms, Some(requested_at + 3_000));

    let row = tf.stats_backend.get(&assignment.id).unwrap().unwrap();
    assert_eq!(row.startup_ms, Some(3_000), "startup time equals elapsed");
}

#[tokio::test(start_paused = true)]
async fn editor_available_fires_exactly_once_across_many_green_ticks() {
    let tf = fleet_with(0);
    let assignment = tf
        .fleet
        .assignment
        .assign(AssignRequest { bucket: "test-bucket-1".into(), ..Default::default() })
        .await
        .unwrap();

    tf.fleet.health.tick().await;
    let first = tf.stats_backend.get(&assignment.id).unwrap().unwrap().code_editor_available_at_ms;
    assert!(first.is_some());

    for _ in 0..5 {
        tf.clock.advance(Duration::from_secs(5));
        tf.fleet.health.tick().await;
    }
    let row = tf.stats_backend.get(&assignment.id).unwrap().unwrap();
    assert_eq!(row.code_editor_available_at_ms, first);
}

#[tokio::test(start_paused = true)]
async fn three_consecutive_failures_write_failed_once() {
    let tf = fleet_with(0);
    let assignment = tf
        .fleet
        .assignment
        .assign(AssignRequest { bucket: "test-bucket-1".into(), ..Default::default() })
        .await
        .unwrap();
    tf.fleet.health.tick().await;
    assert_eq!(tf.fleet.store.get(&assignment.id).unwrap().unwrap().status, WorkspaceStatus::Running);

    tf.prober.set_default(ProbeOutcome::Error("connection refused".into()));
    for _ in 0..2 {
        tf.fleet.health.tick().await;
    }
    assert_eq!(
        tf.fleet.store.get(&assignment.id).unwrap().unwrap().status,
        WorkspaceStatus::Running,
        "two failures are not enough"
    );

    tf.fleet.health.tick().await;
    assert_eq!(tf.fleet.store.get(&assignment.id).unwrap().unwrap().status, WorkspaceStatus::Failed);

    // Further failing ticks must not rewrite the status.
    tf.fleet.health.tick().await;
    tf.fleet.health.tick().await;
    assert_eq!(tf.fleet.store.get(&assignment.id).unwrap().unwrap().status, WorkspaceStatus::Failed);
}

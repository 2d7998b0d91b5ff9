// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation scenarios: ghost records, idempotence, archival window.

use std::time::Duration;

use idepool_core::{Clock, ShutdownReason, WorkspaceBuilder, WorkspaceStatus};
use idepool_storage::ListFilter;

use super::support::{converge_pool, fleet_with};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test(start_paused = true)]
async fn ghost_running_record_is_deleted_on_the_next_tick() {
    let tf = fleet_with(0);
    let ghost = WorkspaceBuilder::new("ghost123").status(WorkspaceStatus::Running).build();
    tf.fleet.store.save(&ghost).unwrap();

    tf.fleet.reaper.tick().await;
    assert!(tf.fleet.store.get(&ghost.id).unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn reaper_is_idempotent_over_a_mixed_fleet() {
    let tf = fleet_with(2);
    converge_pool(&tf, 3).await;

    // One ghost, one freshly stopped workspace, two live pre-warms.
    let ghost = WorkspaceBuilder::new("ghost123").status(WorkspaceStatus::Running).build();
    tf.fleet.store.save(&ghost).unwrap();
    let stopped_id = tf.fleet.registry.ids().pop().unwrap();
    tf.fleet.stop_workspace(&stopped_id, ShutdownReason::Manual).await.unwrap();

    tf.fleet.reaper.tick().await;
    let after_first = tf.fleet.store.list(ListFilter::default()).unwrap();

    tf.fleet.reaper.tick().await;
    let after_second = tf.fleet.store.list(ListFilter::default()).unwrap();

    assert_eq!(after_first, after_second);
    assert!(tf.fleet.store.get(&ghost.id).unwrap().is_none());
    assert!(tf.fleet.store.get(&stopped_id).unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn archive_honors_the_24h_window() {
    let tf = fleet_with(0);

    // Archive runs before the ghost/reap passes, so the stale record must
    // land in the archive even though its service is long gone.
    let now = tf.clock.epoch_ms();
    let fresh = WorkspaceBuilder::new("fresh123")
        .stopped(now - DAY.as_millis() as u64 + 1_000, ShutdownReason::Inactivity)
        .build();
    let stale = WorkspaceBuilder::new("stale123")
        .stopped(now - DAY.as_millis() as u64 - 1_000, ShutdownReason::Inactivity)
        .build();
    tf.fleet.store.save(&fresh).unwrap();
    tf.fleet.store.save(&stale).unwrap();

    tf.fleet.reaper.tick().await;

    // The stale record went to the archive; the fresh one was reaped (its
    // service is gone) but never archived.
    assert_eq!(tf.fleet.store.archived_count().unwrap(), 1);
    assert!(tf.fleet.store.get(&stale.id).unwrap().is_none());
    assert!(tf.fleet.store.get(&fresh.id).unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn fresh_stopped_record_is_never_archived_before_24h() {
    let tf = fleet_with(0);
    let now = tf.clock.epoch_ms();
    let fresh = WorkspaceBuilder::new("fresh123")
        .stopped(now - 60_000, ShutdownReason::Manual)
        .build();
    tf.fleet.store.save(&fresh).unwrap();

    tf.fleet.reaper.tick().await;
    assert_eq!(tf.fleet.store.archived_count().unwrap(), 0);

    // A day later the record would have been archived had it survived; it
    // was already reaped, so the archive stays empty.
    tf.clock.advance(DAY);
    tf.fleet.reaper.tick().await;
    assert_eq!(tf.fleet.store.archived_count().unwrap(), 0);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool maintenance scenarios: convergence, resource gating, adoption.

use idepool_core::WorkspaceStatus;
use idepool_engine::AdmissionDecision;
use idepool_storage::ListFilter;

use super::support::{converge_pool, fleet_with};

#[tokio::test(start_paused = true)]
async fn empty_pool_converges_to_target_in_bounded_ticks() {
    let tf = fleet_with(3);

    converge_pool(&tf, 5).await;

    let stats = tf.fleet.registry.stats();
    assert_eq!(stats.pre_warmed, 3);
    assert_eq!(stats.target, 3);
    assert_eq!(tf.fleet.registry.deficit(), 0);

    // Every pool member is persisted as a running pre-warm.
    let running = tf
        .fleet
        .store
        .list(ListFilter { status: Some(WorkspaceStatus::Running), ..Default::default() })
        .unwrap();
    assert_eq!(running.len(), 3);
    assert!(running.iter().all(|ws| ws.is_pre_warmed && ws.bucket.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn gated_maintainer_spawns_nothing() {
    let tf = fleet_with(3);
    tf.admission.set_decision(AdmissionDecision::deny("memory pressure"));

    for _ in 0..3 {
        tf.fleet.maintainer.tick().await;
    }

    assert_eq!(tf.orchestrator.create_count(), 0);
    assert_eq!(tf.fleet.registry.stats().total, 0);
}

#[tokio::test(start_paused = true)]
async fn claimed_workspaces_are_replaced_on_the_next_tick() {
    let tf = fleet_with(2);
    converge_pool(&tf, 3).await;

    tf.fleet
        .assignment
        .assign(idepool_engine::AssignRequest { bucket: "test-bucket-1".into(), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(tf.fleet.registry.stats().pre_warmed, 1);

    tf.fleet.maintainer.tick().await;
    assert_eq!(tf.fleet.registry.stats().pre_warmed, 2);
}

#[tokio::test(start_paused = true)]
async fn live_pre_warms_from_a_previous_run_are_adopted() {
    let tf = fleet_with(2);
    let prior = idepool_core::WorkspaceId::parse("prior123").unwrap();
    tf.orchestrator.seed_pre_warmed(&prior);

    tf.fleet.maintainer.tick().await;

    assert!(tf.fleet.registry.contains(&prior), "prior pre-warm adopted");
    assert_eq!(tf.fleet.registry.stats().pre_warmed, 2, "adoption counts toward target");
    assert_eq!(tf.orchestrator.create_count(), 1, "only the missing member was spawned");
}

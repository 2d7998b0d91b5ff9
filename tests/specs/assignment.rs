// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignment-path scenarios: pool hit, pool miss, attach rollback,
//! concurrent claims.

use futures_util::future::join_all;
use idepool_core::WorkspaceStatus;
use idepool_engine::AssignRequest;

use super::support::{converge_pool, fleet_with};

fn request(bucket: &str) -> AssignRequest {
    AssignRequest { bucket: bucket.to_string(), ..Default::default() }
}

#[tokio::test(start_paused = true)]
async fn pool_hit_serves_from_the_pre_warmed_pool() {
    let tf = fleet_with(2);
    converge_pool(&tf, 3).await;
    assert_eq!(tf.fleet.registry.stats().pre_warmed, 2);

    let assignment = tf.fleet.assignment.assign(request("test-bucket-1")).await.unwrap();

    assert!(assignment.used_queue);
    assert_eq!(assignment.status, WorkspaceStatus::Starting);
    assert_eq!(
        assignment.urls.editor,
        format!("http://localhost/editor/{}", assignment.id)
    );

    let record = tf.fleet.store.get(&assignment.id).unwrap().unwrap();
    assert!(record.is_pre_warmed);
    assert_eq!(record.status, WorkspaceStatus::Starting);
    assert_eq!(record.bucket, "test-bucket-1");

    // No fresh launch beyond the two pool spawns.
    assert_eq!(tf.orchestrator.create_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn pool_miss_launches_exactly_one_fresh_service() {
    let tf = fleet_with(0);

    let assignment = tf.fleet.assignment.assign(request("test-bucket-1")).await.unwrap();

    assert!(!assignment.used_queue);
    assert_eq!(tf.orchestrator.create_count(), 1);
    let record = tf.fleet.store.get(&assignment.id).unwrap().unwrap();
    assert!(!record.is_pre_warmed);
}

#[tokio::test(start_paused = true)]
async fn attach_failure_falls_back_and_the_pool_recovers() {
    let tf = fleet_with(1);
    converge_pool(&tf, 3).await;
    let pooled = tf.fleet.registry.ids().pop().unwrap();

    tf.orchestrator.fail_attach("env update rejected");
    let assignment = tf.fleet.assignment.assign(request("test-bucket-1")).await.unwrap();
    tf.orchestrator.clear_attach_failure();

    // Served via the fresh path; the poisoned entry is gone everywhere.
    assert!(!assignment.used_queue);
    assert_ne!(assignment.id, pooled);
    assert!(!tf.fleet.registry.contains(&pooled));
    assert!(tf.fleet.store.get(&pooled).unwrap().is_none());

    // The next maintainer tick schedules the replacement.
    tf.fleet.maintainer.tick().await;
    assert_eq!(tf.fleet.registry.stats().pre_warmed, 1);
}

#[tokio::test(start_paused = true)]
async fn five_concurrent_requests_share_one_pre_warm() {
    let tf = fleet_with(1);
    converge_pool(&tf, 3).await;

    let assignments = join_all((0..5).map(|i| {
        let handler = std::sync::Arc::clone(&tf.fleet.assignment);
        let bucket = format!("bucket-{i}");
        async move { handler.assign(request(&bucket)).await }
    }))
    .await;

    let assignments: Vec<_> = assignments.into_iter().map(|a| a.unwrap()).collect();
    let from_queue = assignments.iter().filter(|a| a.used_queue).count();
    assert_eq!(from_queue, 1, "exactly one request gets the pre-warm");

    let mut ids: Vec<String> = assignments.iter().map(|a| a.id.to_string()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5, "no two records share an id");
}

#[tokio::test(start_paused = true)]
async fn started_record_round_trips_with_exact_urls() {
    let tf = fleet_with(0);
    let assignment = tf.fleet.assignment.assign(request("test-bucket-1")).await.unwrap();

    let record = tf.fleet.store.get(&assignment.id).unwrap().unwrap();
    let id = &record.id;
    assert_eq!(record.service_name, format!("ide-{id}"));
    assert_eq!(record.urls.editor, format!("http://localhost/editor/{id}"));
    assert_eq!(record.urls.desktop, format!("http://localhost/desktop/{id}"));
    assert_eq!(record.urls.web, format!("http://localhost/web/{id}"));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::health::{EndpointProber, ScriptedProber};
use crate::probe::FixedAdmission;
use idepool_core::FakeClock;
use idepool_storage::StatsStore;
use idepool_adapters::{FakeOrchestrator, StaticBucketValidator};

struct Fixture {
    handler: AssignmentHandler<FakeClock>,
    registry: Arc<QueueRegistry>,
    store: Arc<WorkspaceStore>,
    orchestrator: Arc<FakeOrchestrator>,
    admission: Arc<FixedAdmission>,
    stats_backend: Arc<StatsStore>,
    clock: FakeClock,
}

fn fixture_with_validator(validator: StaticBucketValidator) -> Fixture {
    let clock = FakeClock::new();
    let registry = Arc::new(QueueRegistry::new(1));
    let store = Arc::new(WorkspaceStore::open_in_memory().unwrap());
    let orchestrator = Arc::new(FakeOrchestrator::new(clock.clone()));
    let admission = Arc::new(FixedAdmission::allowing());
    let stats_backend = Arc::new(StatsStore::open_in_memory().unwrap());
    let stats = Arc::new(LifecycleStats::new(Arc::clone(&stats_backend)));
    let prober = Arc::new(ScriptedProber::all_failing());
    let health = Arc::new(HealthMonitor::new(
        Arc::clone(&store),
        prober as Arc<dyn EndpointProber>,
        Arc::clone(&registry),
        Arc::clone(&stats),
        clock.clone(),
        3,
    ));

    let handler = AssignmentHandler::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::clone(&orchestrator) as Arc<dyn Orchestrator>,
        Arc::new(validator) as Arc<dyn BucketValidator>,
        Arc::clone(&admission) as Arc<dyn Admission>,
        stats,
        health,
        clock.clone(),
        AssignmentSettings {
            domain: "localhost".into(),
            region_default: "us-east-1".into(),
            credentials_default: None,
            cpu_cores: 2.0,
            memory_bytes: 1024,
        },
    );
    Fixture { handler, registry, store, orchestrator, admission, stats_backend, clock }
}

fn fixture() -> Fixture {
    fixture_with_validator(StaticBucketValidator::accepting())
}

/// Seed one ready pre-warmed workspace: live service, registry entry,
/// store record. This is the state the maintainer leaves behind.
async fn seed_pool(fx: &Fixture) -> WorkspaceId {
    let created = fx
        .orchestrator
        .create(CreateOptions { skip_bucket_attachment: true, domain: "localhost".into(), ..Default::default() })
        .await
        .unwrap();
    fx.registry.insert(created.id.clone(), created.created_at_ms);
    let ws = idepool_core::WorkspaceBuilder::new(created.id.as_str())
        .status(WorkspaceStatus::Running)
        .started_at_ms(created.created_at_ms)
        .build();
    fx.store.save(&ws).unwrap();
    created.id
}

fn request(bucket: &str) -> AssignRequest {
    AssignRequest { bucket: bucket.to_string(), ..Default::default() }
}

#[tokio::test]
async fn pool_hit_binds_the_claimed_workspace() {
    let fx = fixture();
    let pooled = seed_pool(&fx).await;

    let assignment = fx.handler.assign(request("test-bucket-1")).await.unwrap();

    assert_eq!(assignment.id, pooled);
    assert!(assignment.used_queue);
    assert_eq!(assignment.status, WorkspaceStatus::Starting);
    assert_eq!(assignment.service_name, format!("ide-{pooled}"));
    assert_eq!(assignment.urls.editor, format!("http://localhost/editor/{pooled}"));

    // Bucket reached the runtime and the registry entry.
    assert_eq!(fx.orchestrator.bucket_of(&pooled).as_deref(), Some("test-bucket-1"));
    assert_eq!(fx.registry.get(&pooled).unwrap().bucket.as_deref(), Some("test-bucket-1"));

    // The store reflects the assignment.
    let ws = fx.store.get(&pooled).unwrap().unwrap();
    assert!(ws.is_pre_warmed);
    assert_eq!(ws.status, WorkspaceStatus::Starting);
    assert_eq!(ws.bucket, "test-bucket-1");

    // Only the seed create happened.
    assert_eq!(fx.orchestrator.create_count(), 1);
}

#[tokio::test]
async fn pool_miss_launches_fresh() {
    let fx = fixture();

    let assignment = fx.handler.assign(request("test-bucket-1")).await.unwrap();

    assert!(!assignment.used_queue);
    assert_eq!(fx.orchestrator.create_count(), 1, "orchestrator-create called exactly once");
    let ws = fx.store.get(&assignment.id).unwrap().unwrap();
    assert!(!ws.is_pre_warmed);
    assert_eq!(ws.status, WorkspaceStatus::Starting);
}

#[tokio::test]
async fn malformed_bucket_name_is_rejected_before_any_work() {
    let fx = fixture();
    seed_pool(&fx).await;

    let err = fx.handler.assign(request("Bad_Bucket!")).await.unwrap_err();
    assert_eq!(err.kind(), idepool_core::ErrorKind::InvalidBucket);

    // Nothing was claimed, nothing extra created.
    assert_eq!(fx.registry.stats().pre_warmed, 1);
    assert_eq!(fx.orchestrator.create_count(), 1);
}

#[tokio::test]
async fn inaccessible_bucket_is_rejected() {
    let fx = fixture_with_validator(StaticBucketValidator::rejecting());
    seed_pool(&fx).await;

    let err = fx.handler.assign(request("missing-bucket")).await.unwrap_err();
    assert_eq!(err.kind(), idepool_core::ErrorKind::InvalidBucket);
    assert_eq!(fx.registry.stats().pre_warmed, 1, "claim happens after validation");
}

#[tokio::test]
async fn validator_resolved_region_wins() {
    let fx = fixture_with_validator(StaticBucketValidator::redirecting_to("eu-west-1"));

    let assignment = fx.handler.assign(request("test-bucket-1")).await.unwrap();
    let ws = fx.store.get(&assignment.id).unwrap().unwrap();
    assert_eq!(ws.region, "eu-west-1");
}

#[tokio::test]
async fn dummy_credentials_skip_the_remote_check() {
    let fx = fixture_with_validator(StaticBucketValidator::rejecting());
    let assignment = fx
        .handler
        .assign(AssignRequest {
            bucket: "test-bucket-1".into(),
            credentials: Some(idepool_core::Credentials {
                access_key_id: "dummy".into(),
                secret_access_key: "dummy".into(),
            }),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(fx.store.get(&assignment.id).unwrap().is_some());
}

#[tokio::test]
async fn attach_failure_discards_pre_warm_and_falls_back() {
    let fx = fixture();
    let poisoned = seed_pool(&fx).await;
    fx.orchestrator.fail_attach("env update rejected");

    let assignment = fx.handler.assign(request("test-bucket-1")).await.unwrap();

    // Served via fresh launch.
    assert_ne!(assignment.id, poisoned);
    assert!(!assignment.used_queue);
    assert_eq!(fx.orchestrator.create_count(), 2);

    // The poisoned entry is fully gone: registry, runtime, store.
    assert!(!fx.registry.contains(&poisoned));
    assert!(fx.orchestrator.bucket_of(&poisoned).is_none());
    assert!(fx.store.get(&poisoned).unwrap().is_none());

    // And the pool now has a deficit for the maintainer to fill.
    assert_eq!(fx.registry.deficit(), 1);
}

#[tokio::test]
async fn resource_gate_refuses_fresh_launches() {
    let fx = fixture();
    fx.admission.set_decision(crate::probe::AdmissionDecision::deny("memory pressure"));

    let err = fx.handler.assign(request("test-bucket-1")).await.unwrap_err();
    assert_eq!(err.kind(), idepool_core::ErrorKind::ResourceExhausted);
    assert_eq!(fx.orchestrator.create_count(), 0);
}

#[tokio::test]
async fn pool_hit_bypasses_the_resource_gate() {
    let fx = fixture();
    seed_pool(&fx).await;
    fx.admission.set_decision(crate::probe::AdmissionDecision::deny("memory pressure"));

    let assignment = fx.handler.assign(request("test-bucket-1")).await.unwrap();
    assert!(assignment.used_queue, "claimed containers cost nothing new");
}

#[tokio::test]
async fn launch_failure_surfaces_with_cause() {
    let fx = fixture();
    fx.orchestrator.fail_next_create("image pull failed");

    let err = fx.handler.assign(request("test-bucket-1")).await.unwrap_err();
    assert_eq!(err.kind(), idepool_core::ErrorKind::LaunchFailed);
    assert!(err.to_string().contains("image pull failed"));
}

#[tokio::test]
async fn request_stats_row_is_recorded() {
    let fx = fixture();
    let received = fx.clock.epoch_ms();

    let assignment = fx
        .handler
        .assign(AssignRequest {
            bucket: "test-bucket-1".into(),
            user_id: Some("u-7".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let row = fx.stats_backend.get(&assignment.id).unwrap().unwrap();
    assert_eq!(row.bucket, "test-bucket-1");
    assert_eq!(row.user_id.as_deref(), Some("u-7"));
    assert_eq!(row.request_received_at_ms, received);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: a fleet assembled exactly like the daemon does it, but
//! against the in-memory orchestrator, a scripted prober, and a fake clock.

use std::sync::Arc;

use idepool_core::{FakeClock, FleetConfig, LoopPeriods};
use idepool_engine::{
    Admission, EndpointProber, FixedAdmission, Fleet, FleetDeps, LifecycleStats, ScriptedProber,
};
use idepool_storage::{StatsStore, WorkspaceStore};
use idepool_adapters::{BucketValidator, FakeOrchestrator, Orchestrator, StaticBucketValidator};

pub struct TestFleet {
    pub fleet: Fleet<FakeClock>,
    pub orchestrator: Arc<FakeOrchestrator>,
    pub prober: Arc<ScriptedProber>,
    pub admission: Arc<FixedAdmission>,
    pub stats_backend: Arc<StatsStore>,
    pub clock: FakeClock,
}

pub fn fleet_with(target_pool_size: usize) -> TestFleet {
    let config = FleetConfig {
        target_pool_size,
        loop_periods: LoopPeriods { queue_secs: 1, health_secs: 1, cleanup_secs: 1 },
        ..Default::default()
    };
    let clock = FakeClock::new();
    let orchestrator = Arc::new(FakeOrchestrator::new(clock.clone()));
    let prober = Arc::new(ScriptedProber::all_healthy());
    let admission = Arc::new(FixedAdmission::allowing());
    let stats_backend = Arc::new(StatsStore::open_in_memory().unwrap());

    let fleet = Fleet::assemble(
        config,
        FleetDeps {
            orchestrator: Arc::clone(&orchestrator) as Arc<dyn Orchestrator>,
            validator: Arc::new(StaticBucketValidator::accepting()) as Arc<dyn BucketValidator>,
            prober: Arc::clone(&prober) as Arc<dyn EndpointProber>,
            admission: Arc::clone(&admission) as Arc<dyn Admission>,
            store: Arc::new(WorkspaceStore::open_in_memory().unwrap()),
            stats: Arc::new(LifecycleStats::new(Arc::clone(&stats_backend))),
            clock: clock.clone(),
        },
    );

    TestFleet { fleet, orchestrator, prober, admission, stats_backend, clock }
}

/// Fill the pool by running maintainer ticks until it converges or the
/// tick budget runs out.
pub async fn converge_pool(tf: &TestFleet, max_ticks: usize) {
    for _ in 0..max_ticks {
        tf.fleet.maintainer.tick().await;
        if tf.fleet.registry.deficit() == 0 {
            return;
        }
    }
}

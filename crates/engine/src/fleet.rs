// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet assembly: the explicit dependency graph.
//!
//! Every component is constructed here and handed its collaborators; there
//! is no process-wide registry. The daemon builds one `Fleet` from real
//! adapters, the tests build one from fakes. The wiring is identical.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use idepool_core::{Clock, ErrorKind, FleetConfig, ShutdownReason, WorkspaceId, WorkspaceStatus};
use idepool_storage::{LifecyclePatch, StoreError, WorkspaceStore};

use crate::assign::{AssignmentHandler, AssignmentSettings};
use crate::health::{EndpointProber, HealthMonitor};
use crate::loops::{spawn_loop, LoopHeartbeats};
use crate::maintainer::{MaintainerSettings, QueueMaintainer};
use crate::probe::Admission;
use crate::registry::QueueRegistry;
use crate::reaper::CleanupReaper;
use crate::stats::LifecycleStats;
use idepool_adapters::{BucketValidator, Orchestrator, StopOutcome};

/// Boundary dependencies the fleet is assembled from.
pub struct FleetDeps<C: Clock> {
    pub orchestrator: Arc<dyn Orchestrator>,
    pub validator: Arc<dyn BucketValidator>,
    pub prober: Arc<dyn EndpointProber>,
    pub admission: Arc<dyn Admission>,
    pub store: Arc<WorkspaceStore>,
    pub stats: Arc<LifecycleStats>,
    pub clock: C,
}

/// Failure of a stop request.
#[derive(Debug, thiserror::Error)]
pub enum StopError {
    #[error("workspace not found: {0}")]
    NotFound(WorkspaceId),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl StopError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StopError::NotFound(_) => ErrorKind::NotFound,
            StopError::Runtime(_) => ErrorKind::LaunchFailed,
            StopError::Store(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// The assembled control plane.
pub struct Fleet<C: Clock> {
    pub config: FleetConfig,
    pub registry: Arc<QueueRegistry>,
    pub store: Arc<WorkspaceStore>,
    pub stats: Arc<LifecycleStats>,
    pub health: Arc<HealthMonitor<C>>,
    pub maintainer: Arc<QueueMaintainer<C>>,
    pub reaper: Arc<CleanupReaper<C>>,
    pub assignment: Arc<AssignmentHandler<C>>,
    pub admission: Arc<dyn Admission>,
    pub orchestrator: Arc<dyn Orchestrator>,
    clock: C,
}

impl<C: Clock> Fleet<C> {
    /// Wire every component against the given boundaries.
    pub fn assemble(config: FleetConfig, deps: FleetDeps<C>) -> Self {
        let registry = Arc::new(QueueRegistry::new(config.target_pool_size));

        let health = Arc::new(HealthMonitor::new(
            Arc::clone(&deps.store),
            Arc::clone(&deps.prober),
            Arc::clone(&registry),
            Arc::clone(&deps.stats),
            deps.clock.clone(),
            config.max_consecutive_failures,
        ));

        let maintainer = Arc::new(QueueMaintainer::new(
            Arc::clone(&registry),
            Arc::clone(&deps.store),
            Arc::clone(&deps.orchestrator),
            Arc::clone(&deps.admission),
            Arc::clone(&deps.prober),
            Arc::clone(&health),
            deps.clock.clone(),
            MaintainerSettings::new(
                &config.domain,
                config.cpu_cores_limit,
                config.memory_bytes_limit,
                config.readiness_wait_cap_secs,
            ),
        ));

        let reaper = Arc::new(CleanupReaper::new(
            Arc::clone(&deps.store),
            Arc::clone(&deps.orchestrator),
            deps.clock.clone(),
        ));

        let assignment = Arc::new(AssignmentHandler::new(
            Arc::clone(&registry),
            Arc::clone(&deps.store),
            Arc::clone(&deps.orchestrator),
            Arc::clone(&deps.validator),
            Arc::clone(&deps.admission),
            Arc::clone(&deps.stats),
            Arc::clone(&health),
            deps.clock.clone(),
            AssignmentSettings {
                domain: config.domain.clone(),
                region_default: config.region_default.clone(),
                credentials_default: config.credentials_default.clone(),
                cpu_cores: config.cpu_cores_limit,
                memory_bytes: config.memory_bytes_limit,
            },
        ));

        Self {
            config,
            registry,
            store: deps.store,
            stats: deps.stats,
            health,
            maintainer,
            reaper,
            assignment,
            admission: deps.admission,
            orchestrator: deps.orchestrator,
            clock: deps.clock,
        }
    }

    /// Spawn the three background loops.
    pub fn spawn_loops(
        &self,
        token: &CancellationToken,
        heartbeats: &LoopHeartbeats,
    ) -> Vec<JoinHandle<()>> {
        let periods = self.config.loop_periods;

        let maintainer = Arc::clone(&self.maintainer);
        let queue_loop = spawn_loop(
            "queue",
            Duration::from_secs(periods.queue_secs),
            token.clone(),
            heartbeats.clone(),
            self.clock.clone(),
            move || {
                let maintainer = Arc::clone(&maintainer);
                async move { maintainer.tick().await }
            },
        );

        let health = Arc::clone(&self.health);
        let health_loop = spawn_loop(
            "health",
            Duration::from_secs(periods.health_secs),
            token.clone(),
            heartbeats.clone(),
            self.clock.clone(),
            move || {
                let health = Arc::clone(&health);
                async move { health.tick().await }
            },
        );

        let reaper = Arc::clone(&self.reaper);
        let cleanup_loop = spawn_loop(
            "cleanup",
            Duration::from_secs(periods.cleanup_secs),
            token.clone(),
            heartbeats.clone(),
            self.clock.clone(),
            move || {
                let reaper = Arc::clone(&reaper);
                async move { reaper.tick().await }
            },
        );

        vec![queue_loop, health_loop, cleanup_loop]
    }

    /// Current epoch milliseconds from the fleet's clock.
    pub fn clock_epoch_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Stop a workspace: remove the runtime service (already-gone counts as
    /// success), mark the record stopped, and emit the stop stats event.
    pub async fn stop_workspace(
        &self,
        id: &WorkspaceId,
        reason: ShutdownReason,
    ) -> Result<(), StopError> {
        let Some(_existing) = self.store.get(id)? else {
            return Err(StopError::NotFound(id.clone()));
        };

        match self.orchestrator.stop(id).await {
            Ok(StopOutcome::Removed) => {}
            Ok(StopOutcome::NotFound) => {
                tracing::debug!(workspace_id = %id, "runtime service already gone at stop");
            }
            Err(e) => return Err(StopError::Runtime(e.to_string())),
        }

        let now_ms = self.clock.epoch_ms();
        self.store.update_lifecycle(
            id,
            LifecyclePatch {
                status: Some(WorkspaceStatus::Stopped),
                stopped_at_ms: Some(now_ms),
                shutdown_reason: Some(reason),
                ..Default::default()
            },
        )?;

        self.registry.remove(id);
        self.health.forget(id);
        self.stats.on_stopped(id, now_ms, reason);

        tracing::info!(workspace_id = %id, reason = %reason, "workspace stopped");
        Ok(())
    }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;

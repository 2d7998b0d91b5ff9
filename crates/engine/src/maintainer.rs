// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue maintainer.
//!
//! Background loop that keeps the pre-warmed pool at its target size. Each
//! tick first reconciles the registry against the live runtime: entries
//! whose service vanished are dropped, and live bucket-less services the
//! registry has never seen (pre-warms from a previous run) are adopted.
//! It then spawns replacements for the remaining deficit, gated on resources
//! and paced so the runtime is not stampeded.
//!
//! A spawn is only complete once the editor endpoint answers through the
//! proxy; a pre-warm that never becomes ready is marked failed and
//! abandoned rather than left to leak.

use std::sync::Arc;
use std::time::Duration;

use idepool_core::{Clock, ServiceUrls, Workspace, WorkspaceId, WorkspaceStatus, SERVICE_PREFIX};
use idepool_storage::{LifecyclePatch, WorkspaceStore};

use crate::health::{EndpointProber, HealthMonitor, ProbeOutcome};
use crate::probe::Admission;
use crate::registry::QueueRegistry;
use idepool_adapters::{CreateOptions, Orchestrator};

/// Tunables for the maintainer. Defaults match production cadence; tests
/// shrink the waits.
#[derive(Debug, Clone)]
pub struct MaintainerSettings {
    /// Domain workspaces are served under
    pub domain: String,
    /// Per-workspace CPU cap in cores
    pub cpu_cores: f64,
    /// Per-workspace memory cap in bytes
    pub memory_bytes: u64,
    /// Fixed delay between consecutive pool spawns
    pub spawn_delay: Duration,
    /// Poll interval while waiting for a fresh pre-warm to become ready
    pub readiness_poll: Duration,
    /// Hard cap on the readiness wait
    pub readiness_cap: Duration,
}

impl MaintainerSettings {
    pub fn new(domain: &str, cpu_cores: f64, memory_bytes: u64, readiness_cap_secs: u64) -> Self {
        Self {
            domain: domain.to_string(),
            cpu_cores,
            memory_bytes,
            spawn_delay: Duration::from_secs(2),
            readiness_poll: Duration::from_secs(2),
            readiness_cap: Duration::from_secs(readiness_cap_secs),
        }
    }
}

/// Background pool maintainer.
pub struct QueueMaintainer<C: Clock> {
    registry: Arc<QueueRegistry>,
    store: Arc<WorkspaceStore>,
    orchestrator: Arc<dyn Orchestrator>,
    admission: Arc<dyn Admission>,
    prober: Arc<dyn EndpointProber>,
    health: Arc<HealthMonitor<C>>,
    clock: C,
    settings: MaintainerSettings,
    tick_lock: tokio::sync::Mutex<()>,
}

impl<C: Clock> QueueMaintainer<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<QueueRegistry>,
        store: Arc<WorkspaceStore>,
        orchestrator: Arc<dyn Orchestrator>,
        admission: Arc<dyn Admission>,
        prober: Arc<dyn EndpointProber>,
        health: Arc<HealthMonitor<C>>,
        clock: C,
        settings: MaintainerSettings,
    ) -> Self {
        Self {
            registry,
            store,
            orchestrator,
            admission,
            prober,
            health,
            clock,
            settings,
            tick_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// One maintenance pass. Skipped when the previous pass is still
    /// running (spawns can take minutes against a cold runtime).
    pub async fn tick(&self) {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            tracing::debug!("queue tick skipped, previous still running");
            return;
        };

        if let Err(e) = self.sync_with_runtime().await {
            tracing::warn!(error = %e, "queue sync with runtime failed, retrying next tick");
            return;
        }

        let deficit = self.registry.deficit();
        if deficit == 0 {
            return;
        }

        let decision = self.admission.can_launch();
        if !decision.allowed {
            tracing::warn!(
                deficit,
                reason = decision.reason.as_deref().unwrap_or("unspecified"),
                "pool below target but launches are gated on resources"
            );
            return;
        }

        tracing::info!(deficit, "replenishing pre-warmed pool");
        for i in 0..deficit {
            if i > 0 {
                tokio::time::sleep(self.settings.spawn_delay).await;
            }
            if let Err(e) = self.spawn_one().await {
                tracing::warn!(error = %e, "pool spawn failed, continuing with next replacement");
            }
        }
    }

    /// Reconcile the registry with the live runtime (the deleting variant:
    /// stale entries are dropped, not just new ones adopted; the store
    /// must never believe in services the runtime lost).
    async fn sync_with_runtime(&self) -> Result<(), String> {
        let live = self.orchestrator.list().await.map_err(|e| e.to_string())?;

        // Only workspace services count; the proxy and the control plane
        // itself share the runtime.
        let live: Vec<_> =
            live.into_iter().filter(|s| s.service_name.starts_with(SERVICE_PREFIX)).collect();

        for id in self.registry.ids() {
            if !live.iter().any(|s| s.id == id) {
                tracing::info!(workspace_id = %id, "pool entry vanished from runtime, dropping");
                self.registry.remove(&id);
            }
        }

        for service in &live {
            if service.bucket.is_empty() && !self.registry.contains(&service.id) {
                tracing::info!(workspace_id = %service.id, "adopting live pre-warmed service");
                self.registry.insert(service.id.clone(), service.created_at_ms);
            }
        }
        Ok(())
    }

    /// Create one pre-warmed workspace and wait for readiness.
    async fn spawn_one(&self) -> Result<(), String> {
        let created = self
            .orchestrator
            .create(CreateOptions {
                skip_bucket_attachment: true,
                domain: self.settings.domain.clone(),
                cpu_cores: self.settings.cpu_cores,
                memory_bytes: self.settings.memory_bytes,
                ..Default::default()
            })
            .await
            .map_err(|e| e.to_string())?;

        let workspace = Workspace {
            id: created.id.clone(),
            service_name: created.service_name.clone(),
            bucket: String::new(),
            region: String::new(),
            status: WorkspaceStatus::Starting,
            created_at_ms: created.created_at_ms,
            started_at_ms: None,
            stopped_at_ms: None,
            last_activity_ms: None,
            shutdown_reason: None,
            urls: created.urls.clone(),
            cpu_cores: self.settings.cpu_cores,
            memory_bytes: self.settings.memory_bytes,
            is_pre_warmed: true,
            user_id: None,
        };
        self.store.save(&workspace).map_err(|e| e.to_string())?;

        if self.wait_until_ready(&created.id, &created.urls).await {
            self.registry.insert(created.id.clone(), created.created_at_ms);
            let patch = LifecyclePatch {
                status: Some(WorkspaceStatus::Running),
                started_at_ms: Some(self.clock.epoch_ms()),
                ..Default::default()
            };
            if let Err(e) = self.store.update_lifecycle(&created.id, patch) {
                tracing::warn!(workspace_id = %created.id, error = %e, "failed to persist pool readiness");
            }
            self.health.probe_now(created.id.clone());
            tracing::info!(workspace_id = %created.id, "pre-warmed workspace ready");
            Ok(())
        } else {
            tracing::warn!(
                workspace_id = %created.id,
                cap_secs = self.settings.readiness_cap.as_secs(),
                "pre-warm never became ready, abandoning"
            );
            let patch =
                LifecyclePatch { status: Some(WorkspaceStatus::Failed), ..Default::default() };
            if let Err(e) = self.store.update_lifecycle(&created.id, patch) {
                tracing::warn!(workspace_id = %created.id, error = %e, "failed to persist pre-warm failure");
            }
            self.registry.remove(&created.id);
            Err(format!("workspace {} not ready within cap", created.id))
        }
    }

    /// Poll the editor endpoint until it answers. 200/302/401 all prove the
    /// editor is up behind the proxy; a 404 means the proxy has not picked
    /// up the route yet.
    async fn wait_until_ready(&self, id: &WorkspaceId, urls: &ServiceUrls) -> bool {
        let poll_ms = self.settings.readiness_poll.as_millis().max(1);
        let max_attempts = (self.settings.readiness_cap.as_millis() / poll_ms).max(1);
        for attempt in 0..max_attempts {
            match self.prober.probe(&urls.editor).await {
                ProbeOutcome::Status(200 | 302 | 401) => return true,
                ProbeOutcome::Status(404) => {
                    tracing::debug!(workspace_id = %id, attempt, "proxy route not active yet");
                }
                ProbeOutcome::Status(status) => {
                    tracing::debug!(workspace_id = %id, attempt, status, "editor not ready");
                }
                ProbeOutcome::Error(e) => {
                    tracing::debug!(workspace_id = %id, attempt, error = %e, "editor not reachable");
                }
            }
            tokio::time::sleep(self.settings.readiness_poll).await;
        }
        false
    }
}

#[cfg(test)]
#[path = "maintainer_tests.rs"]
mod tests;

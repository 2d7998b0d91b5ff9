// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignment handler: the synchronous client-request path.
//!
//! Validate the bucket, claim a pre-warmed workspace (or launch fresh),
//! bind the bucket, persist, and kick off an eager health probe. The claim
//! itself is atomic in the registry; everything after it must either finish
//! the assignment or dispose of the claimed container. A pre-warm whose
//! bucket attachment failed is suspect and is destroyed rather than
//! returned to the pool.

use std::sync::Arc;

use thiserror::Error;

use idepool_core::{
    validate_bucket_name, Clock, Credentials, ErrorKind, ServiceUrls, Workspace, WorkspaceId,
    WorkspaceStatus,
};
use idepool_storage::{StoreError, WorkspaceStore};

use crate::health::HealthMonitor;
use crate::probe::Admission;
use crate::registry::QueueRegistry;
use crate::stats::LifecycleStats;
use idepool_adapters::{BucketValidator, CreateOptions, Orchestrator};

/// Incoming assignment request.
#[derive(Debug, Clone, Default)]
pub struct AssignRequest {
    pub bucket: String,
    pub region: Option<String>,
    pub credentials: Option<Credentials>,
    pub vnc_password: Option<String>,
    pub user_id: Option<String>,
}

/// Successful assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: WorkspaceId,
    pub service_name: String,
    pub urls: ServiceUrls,
    pub status: WorkspaceStatus,
    /// Whether the pre-warmed pool served this request
    pub used_queue: bool,
}

/// Assignment failure, mapped onto the client taxonomy.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("invalid bucket: {0}")]
    InvalidBucket(String),
    #[error("resources exhausted: {0}")]
    ResourceExhausted(String),
    #[error("launch failed: {0}")]
    LaunchFailed(String),
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl AssignError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssignError::InvalidBucket(_) => ErrorKind::InvalidBucket,
            AssignError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            AssignError::LaunchFailed(_) => ErrorKind::LaunchFailed,
            AssignError::Store(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// Fixed settings the handler stamps onto every workspace it creates.
#[derive(Debug, Clone)]
pub struct AssignmentSettings {
    pub domain: String,
    pub region_default: String,
    pub credentials_default: Option<Credentials>,
    pub cpu_cores: f64,
    pub memory_bytes: u64,
}

/// Serves `POST /containers/start`.
pub struct AssignmentHandler<C: Clock> {
    registry: Arc<QueueRegistry>,
    store: Arc<WorkspaceStore>,
    orchestrator: Arc<dyn Orchestrator>,
    validator: Arc<dyn BucketValidator>,
    admission: Arc<dyn Admission>,
    stats: Arc<LifecycleStats>,
    health: Arc<HealthMonitor<C>>,
    clock: C,
    settings: AssignmentSettings,
}

impl<C: Clock> AssignmentHandler<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<QueueRegistry>,
        store: Arc<WorkspaceStore>,
        orchestrator: Arc<dyn Orchestrator>,
        validator: Arc<dyn BucketValidator>,
        admission: Arc<dyn Admission>,
        stats: Arc<LifecycleStats>,
        health: Arc<HealthMonitor<C>>,
        clock: C,
        settings: AssignmentSettings,
    ) -> Self {
        Self { registry, store, orchestrator, validator, admission, stats, health, clock, settings }
    }

    /// Handle one assignment request end to end.
    pub async fn assign(&self, request: AssignRequest) -> Result<Assignment, AssignError> {
        let received_at_ms = self.clock.epoch_ms();

        validate_bucket_name(&request.bucket).map_err(|e| AssignError::InvalidBucket(e.to_string()))?;

        let credentials =
            request.credentials.clone().or_else(|| self.settings.credentials_default.clone());
        let requested_region =
            request.region.clone().unwrap_or_else(|| self.settings.region_default.clone());

        // The validator may resolve the bucket to a different region than
        // requested; the resolved one wins.
        let region = match self
            .validator
            .verify(&request.bucket, &requested_region, credentials.as_ref())
            .await
        {
            Ok(check) => check.region,
            Err(e) => return Err(AssignError::InvalidBucket(e.to_string())),
        };

        // Pool hit: bind the bucket to a claimed pre-warm.
        if let Some(entry) = self.registry.claim_one(received_at_ms) {
            tracing::info!(workspace_id = %entry.id, bucket = %request.bucket, "claimed pre-warmed workspace");
            match self
                .orchestrator
                .attach_bucket(&entry.id, &request.bucket, &region, credentials.as_ref())
                .await
            {
                Ok(()) => {
                    self.registry.bind_bucket(&entry.id, &request.bucket);
                    return self
                        .finish(&request, entry.id, entry.created_at_ms, region, true, received_at_ms)
                        .await;
                }
                Err(e) => {
                    // The container is suspect; destroy it so the sync step
                    // cannot re-adopt it, and let the maintainer replace it.
                    tracing::warn!(
                        workspace_id = %entry.id,
                        error = %e,
                        "bucket attachment failed, discarding pre-warm and falling back to fresh launch"
                    );
                    self.registry.remove(&entry.id);
                    self.health.forget(&entry.id);
                    let _ = self.orchestrator.stop(&entry.id).await;
                    let _ = self.store.delete(&entry.id);
                }
            }
        }

        // Pool miss (or poisoned pool hit): fresh launch, gated on resources.
        let decision = self.admission.can_launch();
        if !decision.allowed {
            return Err(AssignError::ResourceExhausted(
                decision.reason.unwrap_or_else(|| "resource gate refused launch".to_string()),
            ));
        }

        let created = self
            .orchestrator
            .create(CreateOptions {
                skip_bucket_attachment: false,
                bucket: Some(request.bucket.clone()),
                region: Some(region.clone()),
                credentials: credentials.clone(),
                vnc_password: request.vnc_password.clone(),
                domain: self.settings.domain.clone(),
                cpu_cores: self.settings.cpu_cores,
                memory_bytes: self.settings.memory_bytes,
            })
            .await
            .map_err(|e| AssignError::LaunchFailed(e.to_string()))?;

        self.finish(&request, created.id, created.created_at_ms, region, false, received_at_ms)
            .await
    }

    /// Persist the assigned workspace, emit stats, and fire the eager probe.
    async fn finish(
        &self,
        request: &AssignRequest,
        id: WorkspaceId,
        created_at_ms: u64,
        region: String,
        used_queue: bool,
        received_at_ms: u64,
    ) -> Result<Assignment, AssignError> {
        let urls = ServiceUrls::for_workspace(&self.settings.domain, &id);
        let workspace = Workspace {
            service_name: id.service_name(),
            bucket: request.bucket.clone(),
            region,
            status: WorkspaceStatus::Starting,
            created_at_ms,
            started_at_ms: None,
            stopped_at_ms: None,
            last_activity_ms: None,
            shutdown_reason: None,
            urls: urls.clone(),
            cpu_cores: self.settings.cpu_cores,
            memory_bytes: self.settings.memory_bytes,
            is_pre_warmed: used_queue,
            user_id: request.user_id.clone(),
            id: id.clone(),
        };
        self.store.save(&workspace)?;

        self.stats.on_request_received(
            &id,
            &request.bucket,
            request.user_id.as_deref(),
            received_at_ms,
        );

        self.health.probe_now(id.clone());

        tracing::info!(
            workspace_id = %id,
            bucket = %request.bucket,
            used_queue,
            "workspace assigned"
        );
        Ok(Assignment {
            service_name: id.service_name(),
            id,
            urls,
            status: WorkspaceStatus::Starting,
            used_queue,
        })
    }
}

#[cfg(test)]
#[path = "assign_tests.rs"]
mod tests;

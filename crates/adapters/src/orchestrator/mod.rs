// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator adapter: the contract over the container runtime.
//!
//! The runtime owns service execution and restart policy; the control plane
//! only creates, inspects, mutates environment, and removes services. The
//! `list`/`get` views are authoritative over the persistent store: when they
//! disagree, reconciliation trusts the runtime.
//!
//! # Module layout
//!
//! - [`labels`] — reverse-proxy label generation and extraction
//! - [`docker`] — production implementation over the `docker` CLI
//! - `fake` — in-memory implementation for tests (feature `test-support`)

pub mod labels;

mod docker;
pub use docker::DockerOrchestrator;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOrchestrator, OrchestratorCall};

use async_trait::async_trait;
use thiserror::Error;

use idepool_core::{Credentials, ErrorKind, ServiceUrls, WorkspaceId};

/// Errors from orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("launch failed: {0}")]
    LaunchFailed(String),
    #[error("bucket attachment failed: {0}")]
    AttachFailed(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl OrchestratorError {
    /// Taxonomy kind this error surfaces as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::LaunchFailed(_) => ErrorKind::LaunchFailed,
            OrchestratorError::AttachFailed(_) => ErrorKind::AttachFailed,
            OrchestratorError::Runtime(_) => ErrorKind::LaunchFailed,
        }
    }
}

/// Options for creating a workspace service.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Create without binding a bucket (pre-warm path)
    pub skip_bucket_attachment: bool,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub credentials: Option<Credentials>,
    pub vnc_password: Option<String>,
    /// Public domain the reverse proxy serves this workspace under
    pub domain: String,
    /// CPU cap in cores
    pub cpu_cores: f64,
    /// Memory cap in bytes
    pub memory_bytes: u64,
}

/// A freshly created service.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedService {
    pub id: WorkspaceId,
    pub service_name: String,
    pub urls: ServiceUrls,
    pub created_at_ms: u64,
}

/// Live-infrastructure view of one service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub id: WorkspaceId,
    pub service_name: String,
    /// Runtime-reported status string (informational; health is decided by
    /// the monitor, not by this field)
    pub status: String,
    /// Bound bucket per the runtime's labels; empty while pre-warmed
    pub bucket: String,
    pub created_at_ms: u64,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The runtime removed the service
    Removed,
    /// The service was already gone; callers may treat this as success
    NotFound,
}

/// Contract over the container runtime.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Create a workspace service with a fresh, collision-free id and the
    /// reverse-proxy labels from [`labels`].
    async fn create(&self, opts: CreateOptions) -> Result<CreatedService, OrchestratorError>;

    /// Bind a bucket to a running service by updating its environment.
    /// Idempotent; re-attaching the same bucket is a no-op for the agent.
    async fn attach_bucket(
        &self,
        id: &WorkspaceId,
        bucket: &str,
        region: &str,
        credentials: Option<&Credentials>,
    ) -> Result<(), OrchestratorError>;

    /// Remove the runtime service. A service that is already gone yields
    /// [`StopOutcome::NotFound`], not an error.
    async fn stop(&self, id: &WorkspaceId) -> Result<StopOutcome, OrchestratorError>;

    /// List live workspace services. Authoritative over the store.
    async fn list(&self) -> Result<Vec<ServiceRecord>, OrchestratorError>;

    /// Fetch one service, or `None` when the runtime does not know it.
    async fn get(&self, id: &WorkspaceId) -> Result<Option<ServiceRecord>, OrchestratorError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

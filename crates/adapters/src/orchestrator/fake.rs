// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory orchestrator for tests.
//!
//! Mirrors the runtime contract closely enough for the engine's tests:
//! collision-free id generation, label-equivalent bucket tracking, a stop
//! sentinel for vanished services, and injectable failures for the create
//! and attach paths. Every call is recorded so tests can assert interaction
//! counts (e.g. "orchestrator-create called exactly once").

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use idepool_core::{Clock, Credentials, FakeClock, ServiceUrls, WorkspaceId};

use super::{CreateOptions, CreatedService, Orchestrator, OrchestratorError, ServiceRecord, StopOutcome};

/// A recorded orchestrator interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorCall {
    Create { pre_warm: bool, bucket: Option<String> },
    AttachBucket { id: WorkspaceId, bucket: String },
    Stop { id: WorkspaceId },
    List,
    Get { id: WorkspaceId },
}

#[derive(Default)]
struct FakeState {
    services: BTreeMap<String, FakeService>,
    calls: Vec<OrchestratorCall>,
    fail_create: Option<String>,
    fail_attach: Option<String>,
    fail_runtime: Option<String>,
}

#[derive(Clone)]
struct FakeService {
    id: WorkspaceId,
    bucket: String,
    status: String,
    created_at_ms: u64,
}

/// Test double for the runtime.
#[derive(Clone)]
pub struct FakeOrchestrator {
    state: Arc<Mutex<FakeState>>,
    clock: FakeClock,
    domain: String,
}

impl FakeOrchestrator {
    pub fn new(clock: FakeClock) -> Self {
        Self { state: Arc::new(Mutex::new(FakeState::default())), clock, domain: "localhost".into() }
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }

    /// Next `create` fails with the given cause.
    pub fn fail_next_create(&self, cause: &str) {
        self.state.lock().fail_create = Some(cause.to_string());
    }

    /// All `attach_bucket` calls fail until cleared.
    pub fn fail_attach(&self, cause: &str) {
        self.state.lock().fail_attach = Some(cause.to_string());
    }

    pub fn clear_attach_failure(&self) {
        self.state.lock().fail_attach = None;
    }

    /// All runtime reads (`list`/`get`) and stops fail until cleared.
    pub fn fail_runtime(&self, cause: &str) {
        self.state.lock().fail_runtime = Some(cause.to_string());
    }

    /// Remove a service as if the operator killed it out-of-band.
    pub fn vanish(&self, id: &WorkspaceId) {
        self.state.lock().services.remove(&id.service_name());
    }

    /// Insert a live pre-warmed service the control plane has not seen yet,
    /// as after a daemon restart.
    pub fn seed_pre_warmed(&self, id: &WorkspaceId) {
        let created_at_ms = self.clock.epoch_ms();
        self.state.lock().services.insert(
            id.service_name(),
            FakeService {
                id: id.clone(),
                bucket: String::new(),
                status: "running".into(),
                created_at_ms,
            },
        );
    }

    pub fn calls(&self) -> Vec<OrchestratorCall> {
        self.state.lock().calls.clone()
    }

    pub fn create_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, OrchestratorCall::Create { .. }))
            .count()
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().services.len()
    }

    pub fn bucket_of(&self, id: &WorkspaceId) -> Option<String> {
        self.state.lock().services.get(&id.service_name()).map(|s| s.bucket.clone())
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn create(&self, opts: CreateOptions) -> Result<CreatedService, OrchestratorError> {
        let mut state = self.state.lock();
        state.calls.push(OrchestratorCall::Create {
            pre_warm: opts.skip_bucket_attachment,
            bucket: opts.bucket.clone(),
        });
        if let Some(cause) = state.fail_create.take() {
            return Err(OrchestratorError::LaunchFailed(cause));
        }

        let id = loop {
            let candidate = WorkspaceId::generate();
            if !state.services.contains_key(&candidate.service_name()) {
                break candidate;
            }
        };
        let created_at_ms = self.clock.epoch_ms();
        let bucket =
            if opts.skip_bucket_attachment { String::new() } else { opts.bucket.unwrap_or_default() };
        state.services.insert(
            id.service_name(),
            FakeService { id: id.clone(), bucket, status: "starting".into(), created_at_ms },
        );

        let domain = if opts.domain.is_empty() { self.domain.clone() } else { opts.domain };
        let urls = ServiceUrls::for_workspace(&domain, &id);
        Ok(CreatedService { service_name: id.service_name(), id, urls, created_at_ms })
    }

    async fn attach_bucket(
        &self,
        id: &WorkspaceId,
        bucket: &str,
        _region: &str,
        _credentials: Option<&Credentials>,
    ) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(OrchestratorCall::AttachBucket { id: id.clone(), bucket: bucket.to_string() });
        if let Some(cause) = state.fail_attach.clone() {
            return Err(OrchestratorError::AttachFailed(cause));
        }
        match state.services.get_mut(&id.service_name()) {
            Some(service) => {
                service.bucket = bucket.to_string();
                Ok(())
            }
            None => Err(OrchestratorError::AttachFailed(format!("no such service: {id}"))),
        }
    }

    async fn stop(&self, id: &WorkspaceId) -> Result<StopOutcome, OrchestratorError> {
        let mut state = self.state.lock();
        state.calls.push(OrchestratorCall::Stop { id: id.clone() });
        if let Some(cause) = state.fail_runtime.clone() {
            return Err(OrchestratorError::Runtime(cause));
        }
        match state.services.remove(&id.service_name()) {
            Some(_) => Ok(StopOutcome::Removed),
            None => Ok(StopOutcome::NotFound),
        }
    }

    async fn list(&self) -> Result<Vec<ServiceRecord>, OrchestratorError> {
        let mut state = self.state.lock();
        state.calls.push(OrchestratorCall::List);
        if let Some(cause) = state.fail_runtime.clone() {
            return Err(OrchestratorError::Runtime(cause));
        }
        Ok(state
            .services
            .values()
            .map(|s| ServiceRecord {
                id: s.id.clone(),
                service_name: s.id.service_name(),
                status: s.status.clone(),
                bucket: s.bucket.clone(),
                created_at_ms: s.created_at_ms,
            })
            .collect())
    }

    async fn get(&self, id: &WorkspaceId) -> Result<Option<ServiceRecord>, OrchestratorError> {
        let mut state = self.state.lock();
        state.calls.push(OrchestratorCall::Get { id: id.clone() });
        if let Some(cause) = state.fail_runtime.clone() {
            return Err(OrchestratorError::Runtime(cause));
        }
        Ok(state.services.get(&id.service_name()).map(|s| ServiceRecord {
            id: s.id.clone(),
            service_name: s.id.service_name(),
            status: s.status.clone(),
            bucket: s.bucket.clone(),
            created_at_ms: s.created_at_ms,
        }))
    }
}

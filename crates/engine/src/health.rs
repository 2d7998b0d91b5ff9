// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health monitor.
//!
//! Each tick probes the three endpoints of every `starting`/`running`
//! workspace through the reverse proxy. A probe succeeds iff the response
//! status is below 500; a 404 still proves the proxy routes to the service.
//! Promotion (`starting → running`) happens on the first all-green probe;
//! N consecutive failures mark the workspace `failed` exactly once and
//! leave the restart to the runtime's own policy.
//!
//! The monitor is the sole writer of per-workspace health state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use idepool_core::{Clock, Workspace, WorkspaceId, WorkspaceStatus};
use idepool_storage::{LifecyclePatch, WorkspaceStore};

use crate::registry::QueueRegistry;
use crate::stats::LifecycleStats;

/// Per-request probe timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Raw result of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Got an HTTP response with this status
    Status(u16),
    /// Network error or timeout
    Error(String),
}

impl ProbeOutcome {
    /// Anything below 500 proves the route works; 5xx, timeouts, and
    /// network errors count as failures.
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Status(code) if *code < 500)
    }
}

/// Seam over HTTP probing so the monitor is testable without a network.
#[async_trait::async_trait]
pub trait EndpointProber: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Production prober: GET with a hard timeout and redirects disabled, so a
/// misconfigured proxy cannot turn a probe into a hang or a redirect loop.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EndpointProber for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => ProbeOutcome::Status(response.status().as_u16()),
            Err(e) => ProbeOutcome::Error(e.to_string()),
        }
    }
}

/// Health view of one workspace, as reported to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub consecutive_failures: u32,
    pub last_check_ms: u64,
    pub recovery_attempted: bool,
}

#[derive(Default)]
struct HealthState {
    consecutive_failures: u32,
    last_check_ms: u64,
    recovery_attempted: bool,
    editor_event_sent: bool,
}

/// Background health monitor. Shared as `Arc` with the assignment handler
/// (for eager probes) and the daemon (for summaries).
pub struct HealthMonitor<C: Clock> {
    store: Arc<WorkspaceStore>,
    prober: Arc<dyn EndpointProber>,
    registry: Arc<QueueRegistry>,
    stats: Arc<LifecycleStats>,
    clock: C,
    max_consecutive_failures: u32,
    states: Mutex<HashMap<WorkspaceId, HealthState>>,
    tick_lock: tokio::sync::Mutex<()>,
}

impl<C: Clock> HealthMonitor<C> {
    pub fn new(
        store: Arc<WorkspaceStore>,
        prober: Arc<dyn EndpointProber>,
        registry: Arc<QueueRegistry>,
        stats: Arc<LifecycleStats>,
        clock: C,
        max_consecutive_failures: u32,
    ) -> Self {
        Self {
            store,
            prober,
            registry,
            stats,
            clock,
            max_consecutive_failures,
            states: Mutex::new(HashMap::new()),
            tick_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// One monitoring pass over every active workspace. Skipped when the
    /// previous pass is still in flight.
    pub async fn tick(&self) {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            tracing::debug!("health tick skipped, previous still running");
            return;
        };

        let active = match self.store.list_active() {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!(error = %e, "health tick could not read store, retrying next tick");
                return;
            }
        };

        // Drop state for workspaces that left the active statuses.
        {
            let mut states = self.states.lock();
            states.retain(|id, _| active.iter().any(|ws| &ws.id == id));
        }

        futures_util::future::join_all(active.iter().map(|ws| self.check_workspace(ws))).await;
    }

    /// Probe one workspace immediately, outside the tick cadence. Used by
    /// the assignment handler right after an assignment.
    pub fn probe_now(self: &Arc<Self>, id: WorkspaceId) {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            match monitor.store.get(&id) {
                Ok(Some(ws)) if ws.status.is_active() => monitor.check_workspace(&ws).await,
                Ok(_) => {}
                Err(e) => tracing::warn!(%id, error = %e, "eager probe could not read store"),
            }
        });
    }

    /// Drop health state for a workspace that left the active statuses.
    pub fn forget(&self, id: &WorkspaceId) {
        self.states.lock().remove(id);
    }

    pub fn summary(&self, id: &WorkspaceId) -> Option<HealthSummary> {
        self.states.lock().get(id).map(|state| HealthSummary {
            consecutive_failures: state.consecutive_failures,
            last_check_ms: state.last_check_ms,
            recovery_attempted: state.recovery_attempted,
        })
    }

    async fn check_workspace(&self, ws: &Workspace) {
        let (editor, desktop, web) = tokio::join!(
            self.prober.probe(&ws.urls.editor),
            self.prober.probe(&ws.urls.desktop),
            self.prober.probe(&ws.urls.web),
        );
        let editor_ok = editor.is_success();
        let all_ok = editor_ok && desktop.is_success() && web.is_success();
        let now_ms = self.clock.epoch_ms();

        // Decide under the lock, act after releasing it.
        let (emit_editor, promote, recover) = {
            let mut states = self.states.lock();
            let state = states.entry(ws.id.clone()).or_default();
            state.last_check_ms = now_ms;

            let emit_editor = editor_ok && !state.editor_event_sent;
            if emit_editor {
                state.editor_event_sent = true;
            }

            if all_ok {
                state.consecutive_failures = 0;
                state.recovery_attempted = false;
                (emit_editor, ws.status == WorkspaceStatus::Starting, false)
            } else {
                state.consecutive_failures += 1;
                let exhausted = state.consecutive_failures >= self.max_consecutive_failures
                    && !state.recovery_attempted;
                if exhausted {
                    state.recovery_attempted = true;
                }
                (emit_editor, false, exhausted)
            }
        };

        if emit_editor {
            self.stats.on_code_editor_available(&ws.id, now_ms);
        }

        if promote {
            tracing::info!(workspace_id = %ws.id, "all endpoints healthy, promoting to running");
            let patch = LifecyclePatch {
                status: Some(WorkspaceStatus::Running),
                started_at_ms: Some(now_ms),
                ..Default::default()
            };
            if let Err(e) = self.store.update_lifecycle(&ws.id, patch) {
                tracing::warn!(workspace_id = %ws.id, error = %e, "failed to persist promotion");
            }
            self.registry.mark_running(&ws.id);
        }

        if recover {
            tracing::warn!(
                workspace_id = %ws.id,
                failures = self.max_consecutive_failures,
                "consecutive probe failures exhausted, marking failed; runtime restart policy owns the retry"
            );
            let patch =
                LifecyclePatch { status: Some(WorkspaceStatus::Failed), ..Default::default() };
            if let Err(e) = self.store.update_lifecycle(&ws.id, patch) {
                tracing::warn!(workspace_id = %ws.id, error = %e, "failed to persist failure");
            }
            self.registry.remove(&ws.id);
            self.forget(&ws.id);
        }
    }
}

/// Scripted prober for tests: fixed outcome per URL with a default.
#[cfg(any(test, feature = "test-support"))]
pub struct ScriptedProber {
    default: Mutex<ProbeOutcome>,
    per_url: Mutex<HashMap<String, ProbeOutcome>>,
    probed: Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedProber {
    pub fn all_healthy() -> Self {
        Self {
            default: Mutex::new(ProbeOutcome::Status(200)),
            per_url: Mutex::new(HashMap::new()),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn all_failing() -> Self {
        let prober = Self::all_healthy();
        prober.set_default(ProbeOutcome::Error("connection refused".into()));
        prober
    }

    pub fn set_default(&self, outcome: ProbeOutcome) {
        *self.default.lock() = outcome;
    }

    pub fn set_url(&self, url: &str, outcome: ProbeOutcome) {
        self.per_url.lock().insert(url.to_string(), outcome);
    }

    pub fn probed_urls(&self) -> Vec<String> {
        self.probed.lock().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait::async_trait]
impl EndpointProber for ScriptedProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.probed.lock().push(url.to_string());
        if let Some(outcome) = self.per_url.lock().get(url) {
            return outcome.clone();
        }
        self.default.lock().clone()
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle stats hooks.
//!
//! Three best-effort hooks stitched into the request path, the health
//! monitor, and the stop paths. Stats never affect control flow: a write
//! failure is logged and absorbed, and when the backend could not be opened
//! at startup the whole component is disabled.

use std::sync::Arc;

use idepool_core::{ShutdownReason, WorkspaceId};
use idepool_storage::StatsStore;

/// Best-effort recorder of per-workspace lifecycle timings.
pub struct LifecycleStats {
    backend: Option<Arc<StatsStore>>,
}

impl LifecycleStats {
    pub fn new(backend: Arc<StatsStore>) -> Self {
        Self { backend: Some(backend) }
    }

    /// Stats backend unavailable; every hook becomes a no-op.
    pub fn disabled() -> Self {
        tracing::warn!("lifecycle stats backend unavailable, stats disabled");
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Append the request row. `received_at_ms` is captured when the client
    /// request arrived, before pool claim, so startup time includes the
    /// whole assignment path.
    pub fn on_request_received(
        &self,
        id: &WorkspaceId,
        bucket: &str,
        user_id: Option<&str>,
        received_at_ms: u64,
    ) {
        let Some(backend) = &self.backend else { return };
        if let Err(e) = backend.insert_request(id, bucket, user_id, received_at_ms) {
            tracing::warn!(%id, error = %e, "failed to record request stats");
        }
    }

    /// First-healthy hook. Returns true only for the call that landed the
    /// timestamp, so callers can gate their own once-only side effects on it.
    pub fn on_code_editor_available(&self, id: &WorkspaceId, now_ms: u64) -> bool {
        let Some(backend) = &self.backend else { return false };
        match backend.mark_editor_available(id, now_ms) {
            Ok(first) => {
                if first {
                    tracing::info!(%id, "code editor available");
                }
                first
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to record editor-available stats");
                false
            }
        }
    }

    pub fn on_stopped(&self, id: &WorkspaceId, now_ms: u64, reason: ShutdownReason) {
        let Some(backend) = &self.backend else { return };
        if let Err(e) = backend.mark_stopped(id, now_ms, reason) {
            tracing::warn!(%id, error = %e, "failed to record stop stats");
        }
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;

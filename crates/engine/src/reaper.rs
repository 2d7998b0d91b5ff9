// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup reaper.
//!
//! Reconciles the durable store against the live runtime: archives stale
//! stopped records, deletes records whose service vanished out-of-band
//! (operator `docker service rm`, host rebuild), and removes runtime
//! services for records already marked stopped. Every step is idempotent:
//! running the tick twice against the same runtime state is a no-op the
//! second time.

use std::sync::Arc;

use idepool_core::{Clock, WorkspaceStatus};
use idepool_storage::{ListFilter, WorkspaceStore};

use idepool_adapters::Orchestrator;

/// Background store/runtime reconciler.
pub struct CleanupReaper<C: Clock> {
    store: Arc<WorkspaceStore>,
    orchestrator: Arc<dyn Orchestrator>,
    clock: C,
    tick_lock: tokio::sync::Mutex<()>,
}

impl<C: Clock> CleanupReaper<C> {
    pub fn new(store: Arc<WorkspaceStore>, orchestrator: Arc<dyn Orchestrator>, clock: C) -> Self {
        Self { store, orchestrator, clock, tick_lock: tokio::sync::Mutex::new(()) }
    }

    /// One cleanup pass. Skipped when the previous pass is still running.
    pub async fn tick(&self) {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            tracing::debug!("cleanup tick skipped, previous still running");
            return;
        };

        self.archive().await;
        self.delete_ghost_records().await;
        self.reap_stopped().await;
    }

    async fn archive(&self) {
        match self.store.archive_old(self.clock.epoch_ms()) {
            Ok(0) => {}
            Ok(moved) => tracing::info!(moved, "archived stopped workspaces"),
            Err(e) => tracing::warn!(error = %e, "archive pass failed, retrying next tick"),
        }
    }

    /// Delete records whose runtime service no longer exists. Repairs the
    /// drift left by services killed while the control plane was down.
    async fn delete_ghost_records(&self) {
        for status in
            [WorkspaceStatus::Starting, WorkspaceStatus::Running, WorkspaceStatus::Stopped]
        {
            let records = match self.store.list(ListFilter { status: Some(status), ..Default::default() })
            {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = %e, "ghost scan could not read store");
                    return;
                }
            };

            for ws in records {
                match self.orchestrator.get(&ws.id).await {
                    Ok(None) => {
                        tracing::info!(
                            workspace_id = %ws.id,
                            status = %ws.status,
                            "record has no runtime service, deleting"
                        );
                        if let Err(e) = self.store.delete(&ws.id) {
                            tracing::warn!(workspace_id = %ws.id, error = %e, "ghost delete failed");
                        }
                    }
                    Ok(Some(_)) => {}
                    Err(e) => {
                        // Runtime unreachable; leave the record for next tick.
                        tracing::warn!(workspace_id = %ws.id, error = %e, "ghost check failed");
                        return;
                    }
                }
            }
        }
    }

    /// Remove runtime services for records marked stopped, then delete the
    /// records. A service that is already gone counts as success.
    async fn reap_stopped(&self) {
        let stopped = match self
            .store
            .list(ListFilter { status: Some(WorkspaceStatus::Stopped), ..Default::default() })
        {
            Ok(stopped) => stopped,
            Err(e) => {
                tracing::warn!(error = %e, "stopped scan could not read store");
                return;
            }
        };

        for ws in stopped {
            match self.orchestrator.stop(&ws.id).await {
                Ok(_) => {
                    if let Err(e) = self.store.delete(&ws.id) {
                        tracing::warn!(workspace_id = %ws.id, error = %e, "stopped delete failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        workspace_id = %ws.id,
                        error = %e,
                        "could not remove stopped service, leaving for next tick"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;

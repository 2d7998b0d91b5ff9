// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool entry types for the pre-warmed queue.
//!
//! Entries are purely in-memory; the registry that owns them lives in the
//! engine crate. State machine: `PreWarmed → Assigned → Running`, with the
//! single backwards edge `Assigned → PreWarmed` used when bucket attachment
//! fails mid-assignment and the container is returned to the pool.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::WorkspaceId;

/// Pool state of a queued workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    /// Created without a bucket, waiting to serve a request
    PreWarmed,
    /// Claimed by an assignment, bucket binding in flight
    Assigned,
    /// Bound and confirmed healthy
    Running,
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueueState::PreWarmed => "pre_warmed",
            QueueState::Assigned => "assigned",
            QueueState::Running => "running",
        };
        f.write_str(s)
    }
}

/// One member of the pre-warmed pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEntry {
    pub id: WorkspaceId,
    pub service_name: String,
    pub state: QueueState,
    pub created_at_ms: u64,
    /// Set exactly when the entry transitions to [`QueueState::Assigned`]
    pub assigned_at_ms: Option<u64>,
    /// Bound bucket; `None` until `bind_bucket` after a successful attach
    pub bucket: Option<String>,
}

impl QueuedEntry {
    pub fn pre_warmed(id: WorkspaceId, created_at_ms: u64) -> Self {
        let service_name = id.service_name();
        Self {
            id,
            service_name,
            state: QueueState::PreWarmed,
            created_at_ms,
            assigned_at_ms: None,
            bucket: None,
        }
    }
}

/// Aggregate view of the pool, as reported to operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pre_warmed: usize,
    pub assigned: usize,
    pub running: usize,
    pub total: usize,
    pub target: usize,
}

impl QueueStats {
    /// How many spawns are needed to reach the target pool size.
    pub fn deficit(&self) -> usize {
        self.target.saturating_sub(self.pre_warmed)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

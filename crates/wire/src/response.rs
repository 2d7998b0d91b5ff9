// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses from daemon to clients.

use serde::{Deserialize, Serialize};

use idepool_core::{ErrorKind, QueueStats, Workspace};

/// Health view attached to a workspace detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub consecutive_failures: u32,
    pub last_check_ms: u64,
    pub recovery_attempted: bool,
}

/// Full workspace record plus computed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDetail {
    #[serde(flatten)]
    pub workspace: Workspace,
    /// Seconds since promotion, only while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    /// Monitor state, when the workspace is actively probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthInfo>,
}

/// Host resource view for operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub cpu_usage_pct: f32,
    pub cpu_cores: usize,
    pub mem_used: u64,
    pub mem_total: u64,
    pub mem_pct: f32,
    pub disk_used: u64,
    pub disk_total: u64,
    pub disk_pct: f32,
    pub live_workspaces: u64,
}

/// Last tick of one background loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopBeat {
    pub name: String,
    pub last_tick_ms: u64,
}

/// Operator status block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolReport {
    pub queue: QueueStats,
    pub deficit: usize,
    pub resources: ResourceInfo,
    pub loops: Vec<LoopBeat>,
    pub uptime_secs: u64,
}

/// Response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Workspace assigned
    Started { workspace: Box<WorkspaceDetail>, message: String },

    /// Paginated listing
    Workspaces { workspaces: Vec<WorkspaceDetail>, total: u64 },

    /// Single workspace
    Workspace { workspace: Box<WorkspaceDetail> },

    /// Workspace stopped
    Stopped { id: String },

    /// Operator status
    Pool { report: Box<PoolReport> },

    /// Request failed; `http_status` is the fixed taxonomy mapping for
    /// upstream HTTP layers
    Error { kind: ErrorKind, http_status: u16, message: String },
}

impl Response {
    /// Build the error response for a taxonomy kind.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error { kind, http_status: kind.http_status(), message: message.into() }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace record and lifecycle status.
//!
//! A workspace is one developer environment: an orchestrated service exposing
//! editor, desktop, and web endpoints behind the shared reverse proxy. The
//! record here is what the persistent store holds; the in-memory pool entry
//! lives in [`crate::queue`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::WorkspaceId;
use crate::urls::ServiceUrls;

/// Lifecycle status of a workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    /// Service created, endpoints not yet confirmed healthy
    #[default]
    Starting,
    /// Most recent health probe saw all three endpoints respond
    Running,
    /// Stop requested, runtime teardown in progress
    Stopping,
    /// Service stopped; record retained until archived
    Stopped,
    /// Launch or health recovery gave up on this workspace
    Failed,
}

impl WorkspaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceStatus::Starting => "starting",
            WorkspaceStatus::Running => "running",
            WorkspaceStatus::Stopping => "stopping",
            WorkspaceStatus::Stopped => "stopped",
            WorkspaceStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(WorkspaceStatus::Starting),
            "running" => Some(WorkspaceStatus::Running),
            "stopping" => Some(WorkspaceStatus::Stopping),
            "stopped" => Some(WorkspaceStatus::Stopped),
            "failed" => Some(WorkspaceStatus::Failed),
            _ => None,
        }
    }

    /// Statuses the health monitor probes and the reaper reconciles.
    pub fn is_active(&self) -> bool {
        matches!(self, WorkspaceStatus::Starting | WorkspaceStatus::Running)
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a workspace was shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownReason {
    /// The in-workspace agent reported prolonged inactivity
    Inactivity,
    /// An operator or client stopped it explicitly
    Manual,
    /// Health recovery or launch failure
    Error,
    /// Admission gate reclaimed resources
    ResourceLimit,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::Inactivity => "inactivity",
            ShutdownReason::Manual => "manual",
            ShutdownReason::Error => "error",
            ShutdownReason::ResourceLimit => "resource_limit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inactivity" => Some(ShutdownReason::Inactivity),
            "manual" => Some(ShutdownReason::Manual),
            "error" => Some(ShutdownReason::Error),
            "resource_limit" => Some(ShutdownReason::ResourceLimit),
            _ => None,
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable record of a workspace.
///
/// Invariants:
/// - `service_name == id.service_name()`
/// - `bucket.is_empty()` iff the workspace is (still) pre-warmed and unbound
/// - `stopped_at_ms.is_some()` iff `status == Stopped`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub service_name: String,
    /// Object-storage bucket bound to this workspace; empty while pre-warmed
    pub bucket: String,
    pub region: String,
    pub status: WorkspaceStatus,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub stopped_at_ms: Option<u64>,
    pub last_activity_ms: Option<u64>,
    pub shutdown_reason: Option<ShutdownReason>,
    pub urls: ServiceUrls,
    /// CPU cap in cores
    pub cpu_cores: f64,
    /// Memory cap in bytes
    pub memory_bytes: u64,
    /// Whether this workspace was served out of the pre-warmed pool
    pub is_pre_warmed: bool,
    pub user_id: Option<String>,
}

impl Workspace {
    /// Uptime in seconds relative to `now_ms`, only meaningful while running.
    pub fn uptime_secs(&self, now_ms: u64) -> Option<u64> {
        if self.status != WorkspaceStatus::Running {
            return None;
        }
        let started = self.started_at_ms?;
        Some(now_ms.saturating_sub(started) / 1000)
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;

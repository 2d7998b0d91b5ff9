// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and fixtures shared by this crate's tests and, via the
//! `test-support` feature, by other crates' tests.

use crate::id::WorkspaceId;
use crate::urls::ServiceUrls;
use crate::workspace::{ShutdownReason, Workspace, WorkspaceStatus};

/// Builder for [`Workspace`] records in tests.
///
/// Defaults: pre-warmed `starting` workspace on `localhost` with empty
/// bucket, created at t=0.
pub struct WorkspaceBuilder {
    workspace: Workspace,
}

impl WorkspaceBuilder {
    /// Panics on an invalid id token, which is fine in test code.
    #[allow(clippy::panic)]
    pub fn new(id: &str) -> Self {
        let id = match WorkspaceId::parse(id) {
            Ok(id) => id,
            Err(e) => panic!("invalid test workspace id {id:?}: {e}"),
        };
        let service_name = id.service_name();
        let urls = ServiceUrls::for_workspace("localhost", &id);
        Self {
            workspace: Workspace {
                id,
                service_name,
                bucket: String::new(),
                region: "us-east-1".to_string(),
                status: WorkspaceStatus::Starting,
                created_at_ms: 0,
                started_at_ms: None,
                stopped_at_ms: None,
                last_activity_ms: None,
                shutdown_reason: None,
                urls,
                cpu_cores: 2.0,
                memory_bytes: 4 * 1024 * 1024 * 1024,
                is_pre_warmed: true,
                user_id: None,
            },
        }
    }

    pub fn bucket(mut self, bucket: &str) -> Self {
        self.workspace.bucket = bucket.to_string();
        self.workspace.is_pre_warmed = false;
        self
    }

    pub fn status(mut self, status: WorkspaceStatus) -> Self {
        self.workspace.status = status;
        self
    }

    pub fn created_at_ms(mut self, ms: u64) -> Self {
        self.workspace.created_at_ms = ms;
        self
    }

    pub fn started_at_ms(mut self, ms: u64) -> Self {
        self.workspace.started_at_ms = Some(ms);
        self
    }

    pub fn stopped(mut self, at_ms: u64, reason: ShutdownReason) -> Self {
        self.workspace.status = WorkspaceStatus::Stopped;
        self.workspace.stopped_at_ms = Some(at_ms);
        self.workspace.shutdown_reason = Some(reason);
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.workspace.urls = ServiceUrls::for_workspace(domain, &self.workspace.id);
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.workspace.user_id = Some(user_id.to_string());
        self
    }

    pub fn build(self) -> Workspace {
        self.workspace
    }
}

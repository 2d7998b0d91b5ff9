// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests from clients (CLI, HTTP shim) to the daemon.

use serde::{Deserialize, Serialize};

/// Request from client to daemon.
///
/// `List` paging fields arrive as raw strings because the upstream HTTP
/// layer forwards query parameters verbatim; the daemon owns the
/// non-integer/negative rejection so every client gets the same behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Version handshake
    Hello { version: String },

    /// Health check
    Ping,

    /// Assign a workspace bound to a bucket
    Start {
        bucket: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_key_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret_access_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vnc_password: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },

    /// Paginated workspace listing
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<String>,
    },

    /// Fetch one workspace
    Get { id: String },

    /// Stop a workspace (operator/client initiated)
    Stop { id: String },

    /// Stop reported by the workspace's own agent after inactivity.
    /// Deliberately unauthenticated: the socket is the trust boundary.
    InactivityShutdown { id: String },

    /// Pool, resource, and loop status for operators
    PoolStatus,

    /// Orderly daemon shutdown
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

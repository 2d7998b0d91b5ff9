// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service URL scheme at the reverse proxy.
//!
//! Every workspace exposes three endpoints routed by path prefix:
//!
//! ```text
//! {proto}://{domain}/editor/{id}   → code editor      (port 8443)
//! {proto}://{domain}/desktop/{id}  → remote desktop   (port 6080)
//! {proto}://{domain}/web/{id}      → in-workspace web (port 8000)
//! ```
//!
//! `proto` is `http` for `localhost`, `*.localhost`, and raw IP literals;
//! `https` with automatic TLS everywhere else.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::id::WorkspaceId;

/// The three proxied endpoints of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRole {
    Editor,
    Desktop,
    Web,
}

impl ServiceRole {
    pub const ALL: [ServiceRole; 3] = [ServiceRole::Editor, ServiceRole::Desktop, ServiceRole::Web];

    /// URL path segment for this role.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ServiceRole::Editor => "editor",
            ServiceRole::Desktop => "desktop",
            ServiceRole::Web => "web",
        }
    }

    /// Deterministic backend port inside the workspace container.
    pub fn backend_port(&self) -> u16 {
        match self {
            ServiceRole::Editor => 8443,
            ServiceRole::Desktop => 6080,
            ServiceRole::Web => 8000,
        }
    }

    /// Path prefix the proxy routes (and strips) for a workspace.
    pub fn path_prefix(&self, id: &WorkspaceId) -> String {
        format!("/{}/{}", self.path_segment(), id)
    }
}

/// `http` for local/IP domains, `https` (with automatic TLS) otherwise.
pub fn scheme_for_domain(domain: &str) -> &'static str {
    let bare = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')).unwrap_or(domain);
    if domain == "localhost"
        || domain.ends_with(".localhost")
        || bare.parse::<IpAddr>().is_ok()
    {
        "http"
    } else {
        "https"
    }
}

/// Public URLs of one workspace's three endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUrls {
    pub editor: String,
    pub desktop: String,
    pub web: String,
}

impl ServiceUrls {
    pub fn for_workspace(domain: &str, id: &WorkspaceId) -> Self {
        let proto = scheme_for_domain(domain);
        let build = |role: ServiceRole| format!("{}://{}{}", proto, domain, role.path_prefix(id));
        Self {
            editor: build(ServiceRole::Editor),
            desktop: build(ServiceRole::Desktop),
            web: build(ServiceRole::Web),
        }
    }

    pub fn get(&self, role: ServiceRole) -> &str {
        match role {
            ServiceRole::Editor => &self.editor,
            ServiceRole::Desktop => &self.desktop,
            ServiceRole::Web => &self.web,
        }
    }
}

#[cfg(test)]
#[path = "urls_tests.rs"]
mod tests;

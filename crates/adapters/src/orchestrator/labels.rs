// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reverse-proxy label generation.
//!
//! The proxy discovers routing rules from service labels. For each of the
//! three roles the labels declare a path-prefix router, a strip-prefix
//! middleware removing exactly `/{role}/{id}`, and the backend port. Router
//! priority is 10 so workspace routes always win over catch-alls. The TLS
//! certificate resolver is attached only for public DNS names, never for
//! raw IPs or `localhost` domains, where issuance would fail.
//!
//! Metadata labels (`idepool.*`) carry `{domain, id, bucket, prewarmed,
//! created-at-ms}` so `list`/`get` can rebuild records from the runtime
//! alone.

use std::collections::HashMap;

use idepool_core::{scheme_for_domain, ServiceRole, WorkspaceId};

/// Router priority for workspace routes; anything above the proxy's
/// catch-all (priority 1).
pub const ROUTER_PRIORITY: u32 = 10;

/// Certificate resolver name the proxy is configured with.
pub const TLS_RESOLVER: &str = "letsencrypt";

/// Metadata label keys.
pub const LABEL_ID: &str = "idepool.id";
pub const LABEL_DOMAIN: &str = "idepool.domain";
pub const LABEL_BUCKET: &str = "idepool.bucket";
pub const LABEL_PREWARMED: &str = "idepool.prewarmed";
pub const LABEL_CREATED_AT_MS: &str = "idepool.created-at-ms";

/// Build the full label set for a workspace service.
pub fn service_labels(
    domain: &str,
    id: &WorkspaceId,
    bucket: &str,
    pre_warmed: bool,
    created_at_ms: u64,
) -> Vec<(String, String)> {
    let mut labels = vec![("traefik.enable".to_string(), "true".to_string())];
    let tls = scheme_for_domain(domain) == "https";

    for role in ServiceRole::ALL {
        labels.extend(role_labels(id, role, tls));
    }

    labels.push((LABEL_ID.to_string(), id.to_string()));
    labels.push((LABEL_DOMAIN.to_string(), domain.to_string()));
    labels.push((LABEL_BUCKET.to_string(), bucket.to_string()));
    labels.push((LABEL_PREWARMED.to_string(), pre_warmed.to_string()));
    labels.push((LABEL_CREATED_AT_MS.to_string(), created_at_ms.to_string()));
    labels
}

/// Router, middleware, and service labels for one role.
fn role_labels(id: &WorkspaceId, role: ServiceRole, tls: bool) -> Vec<(String, String)> {
    let router = format!("{}-{}", id.service_name(), role.path_segment());
    let prefix = role.path_prefix(id);
    let mut labels = vec![
        (
            format!("traefik.http.routers.{router}.rule"),
            format!("PathPrefix(`{prefix}`) || PathPrefix(`{prefix}/`)"),
        ),
        (format!("traefik.http.routers.{router}.priority"), ROUTER_PRIORITY.to_string()),
        (
            format!("traefik.http.middlewares.{router}-strip.stripprefix.prefixes"),
            prefix.clone(),
        ),
        (format!("traefik.http.routers.{router}.middlewares"), format!("{router}-strip")),
        (
            format!("traefik.http.services.{router}.loadbalancer.server.port"),
            role.backend_port().to_string(),
        ),
    ];
    if tls {
        labels
            .push((format!("traefik.http.routers.{router}.tls.certresolver"), TLS_RESOLVER.into()));
    }
    labels
}

/// Extract `{domain, id}` from a service's labels.
pub fn domain_and_id(labels: &HashMap<String, String>) -> Option<(String, WorkspaceId)> {
    let domain = labels.get(LABEL_DOMAIN)?.clone();
    let id = WorkspaceId::parse(labels.get(LABEL_ID)?).ok()?;
    Some((domain, id))
}

/// Bound bucket per the labels; empty string while pre-warmed.
pub fn bucket(labels: &HashMap<String, String>) -> String {
    labels.get(LABEL_BUCKET).cloned().unwrap_or_default()
}

/// Creation timestamp per the labels, when present and well-formed.
pub fn created_at_ms(labels: &HashMap<String, String>) -> Option<u64> {
    labels.get(LABEL_CREATED_AT_MS)?.parse().ok()
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatch: wire requests to fleet operations.
//!
//! All HTTP-facing behavior is decided here: input validation, the fixed
//! error-kind mapping, computed fields on responses. The upstream HTTP
//! layer stays a dumb forwarder.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use idepool_core::{
    Clock, Credentials, ErrorKind, ShutdownReason, Workspace, WorkspaceId, WorkspaceStatus,
};
use idepool_engine::{Fleet, LoopHeartbeats};
use idepool_storage::ListFilter;
use idepool_wire::{
    HealthInfo, LoopBeat, PoolReport, Request, ResourceInfo, Response, WorkspaceDetail,
};

/// Shared daemon context for all request handlers.
pub struct DaemonCtx<C: Clock> {
    pub fleet: Fleet<C>,
    pub heartbeats: LoopHeartbeats,
    pub shutdown: CancellationToken,
    pub start_time: Instant,
    pub version: String,
}

/// Handle one request.
pub async fn handle<C: Clock>(ctx: &Arc<DaemonCtx<C>>, request: Request) -> Response {
    match request {
        Request::Hello { version } => {
            if version != ctx.version {
                tracing::debug!(client = %version, daemon = %ctx.version, "version skew");
            }
            Response::Hello { version: ctx.version.clone() }
        }
        Request::Ping => Response::Pong,
        Request::Start { bucket, region, access_key_id, secret_access_key, vnc_password, user_id } => {
            start(ctx, bucket, region, access_key_id, secret_access_key, vnc_password, user_id)
                .await
        }
        Request::List { status, limit, offset } => list(ctx, status, limit, offset),
        Request::Get { id } => get(ctx, &id),
        Request::Stop { id } => stop(ctx, &id, ShutdownReason::Manual).await,
        Request::InactivityShutdown { id } => stop(ctx, &id, ShutdownReason::Inactivity).await,
        Request::PoolStatus => pool_status(ctx),
        Request::Shutdown => {
            ctx.shutdown.cancel();
            Response::ShuttingDown
        }
    }
}

async fn start<C: Clock>(
    ctx: &Arc<DaemonCtx<C>>,
    bucket: String,
    region: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    vnc_password: Option<String>,
    user_id: Option<String>,
) -> Response {
    let credentials = match (access_key_id, secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => {
            Some(Credentials { access_key_id, secret_access_key })
        }
        (None, None) => None,
        _ => {
            return Response::error(
                ErrorKind::InvalidInput,
                "access_key_id and secret_access_key must be supplied together",
            )
        }
    };

    let request = idepool_engine::AssignRequest { bucket, region, credentials, vnc_password, user_id };
    match ctx.fleet.assignment.assign(request).await {
        Ok(assignment) => {
            let workspace = match ctx.fleet.store.get(&assignment.id) {
                Ok(Some(workspace)) => workspace,
                // The record was just written; any miss here is a store
                // fault, but the assignment itself succeeded.
                _ => return Response::error(ErrorKind::StoreUnavailable, "record readback failed"),
            };
            Response::Started {
                workspace: Box::new(detail(ctx, workspace)),
                message: "workspace starting".to_string(),
            }
        }
        Err(e) => Response::error(e.kind(), e.to_string()),
    }
}

fn list<C: Clock>(
    ctx: &Arc<DaemonCtx<C>>,
    status: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
) -> Response {
    let status = match status.as_deref() {
        None => None,
        Some(text) => match WorkspaceStatus::parse(text) {
            Some(status) => Some(status),
            None => {
                return Response::error(ErrorKind::InvalidInput, format!("unknown status {text:?}"))
            }
        },
    };
    let limit = match parse_paging(limit.as_deref(), "limit") {
        Ok(limit) => limit,
        Err(response) => return response,
    };
    let offset = match parse_paging(offset.as_deref(), "offset") {
        Ok(offset) => offset,
        Err(response) => return response,
    };

    let filter = ListFilter { status, limit, offset };
    let workspaces = match ctx.fleet.store.list(filter) {
        Ok(workspaces) => workspaces,
        Err(e) => return Response::error(ErrorKind::StoreUnavailable, e.to_string()),
    };
    let total = match ctx.fleet.store.count(status) {
        Ok(total) => total,
        Err(e) => return Response::error(ErrorKind::StoreUnavailable, e.to_string()),
    };

    let workspaces = workspaces.into_iter().map(|ws| detail(ctx, ws)).collect();
    Response::Workspaces { workspaces, total }
}

/// Paging parameters must be non-negative integers.
fn parse_paging(value: Option<&str>, name: &str) -> Result<Option<u32>, Response> {
    let Some(text) = value else { return Ok(None) };
    match text.parse::<i64>() {
        Ok(n) if n >= 0 && n <= u32::MAX as i64 => Ok(Some(n as u32)),
        _ => Err(Response::error(
            ErrorKind::InvalidInput,
            format!("{name} must be a non-negative integer, got {text:?}"),
        )),
    }
}

fn get<C: Clock>(ctx: &Arc<DaemonCtx<C>>, id: &str) -> Response {
    let id = match WorkspaceId::parse(id) {
        Ok(id) => id,
        Err(e) => return Response::error(ErrorKind::InvalidInput, e.to_string()),
    };
    match ctx.fleet.store.get(&id) {
        Ok(Some(workspace)) => Response::Workspace { workspace: Box::new(detail(ctx, workspace)) },
        Ok(None) => Response::error(ErrorKind::NotFound, format!("unknown workspace {id}")),
        Err(e) => Response::error(ErrorKind::StoreUnavailable, e.to_string()),
    }
}

async fn stop<C: Clock>(ctx: &Arc<DaemonCtx<C>>, id: &str, reason: ShutdownReason) -> Response {
    let id = match WorkspaceId::parse(id) {
        Ok(id) => id,
        Err(e) => return Response::error(ErrorKind::InvalidInput, e.to_string()),
    };
    match ctx.fleet.stop_workspace(&id, reason).await {
        Ok(()) => Response::Stopped { id: id.to_string() },
        Err(e) => Response::error(e.kind(), e.to_string()),
    }
}

fn pool_status<C: Clock>(ctx: &Arc<DaemonCtx<C>>) -> Response {
    let queue = ctx.fleet.registry.stats();
    let snapshot = ctx.fleet.admission.snapshot();
    let loops = ctx
        .heartbeats
        .all()
        .into_iter()
        .map(|(name, last_tick_ms)| LoopBeat { name, last_tick_ms })
        .collect();

    Response::Pool {
        report: Box::new(PoolReport {
            deficit: queue.deficit(),
            queue,
            resources: ResourceInfo {
                cpu_usage_pct: snapshot.cpu_usage_pct,
                cpu_cores: snapshot.cpu_cores,
                mem_used: snapshot.mem_used,
                mem_total: snapshot.mem_total,
                mem_pct: snapshot.mem_pct,
                disk_used: snapshot.disk_used,
                disk_total: snapshot.disk_total,
                disk_pct: snapshot.disk_pct,
                live_workspaces: snapshot.live_workspaces,
            },
            loops,
            uptime_secs: ctx.start_time.elapsed().as_secs(),
        }),
    }
}

/// Attach computed fields to a record.
fn detail<C: Clock>(ctx: &Arc<DaemonCtx<C>>, workspace: Workspace) -> WorkspaceDetail {
    let now_ms = ctx.fleet.clock_epoch_ms();
    let uptime_secs = workspace.uptime_secs(now_ms);
    let health = ctx.fleet.health.summary(&workspace.id).map(|summary| HealthInfo {
        consecutive_failures: summary.consecutive_failures,
        last_check_ms: summary.last_check_ms,
        recovery_attempted: summary.recovery_attempted,
    });
    WorkspaceDetail { workspace, uptime_secs, health }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

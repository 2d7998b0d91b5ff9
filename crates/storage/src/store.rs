// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace store: upsert, lookup, partial lifecycle updates, archival.
//!
//! Single-writer discipline comes from the connection mutex; every operation
//! is one short transaction against the local file. A record exists here iff
//! the control plane believes the service exists or existed recently; the
//! reaper keeps that invariant against the live runtime.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use idepool_core::{
    ErrorKind, ServiceUrls, ShutdownReason, Workspace, WorkspaceId, WorkspaceStatus,
};

use crate::schema;

/// Persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt row for workspace {id}: {reason}")]
    CorruptRow { id: String, reason: String },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StoreUnavailable
    }
}

/// Filter for [`WorkspaceStore::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
    pub status: Option<WorkspaceStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Named-field partial update for [`WorkspaceStore::update_lifecycle`].
///
/// Only fields that are `Some` are written; everything else is untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecyclePatch {
    pub status: Option<WorkspaceStatus>,
    pub started_at_ms: Option<u64>,
    pub stopped_at_ms: Option<u64>,
    pub last_activity_ms: Option<u64>,
    pub shutdown_reason: Option<ShutdownReason>,
}

/// Durable table of workspace records.
pub struct WorkspaceStore {
    conn: Mutex<Connection>,
}

impl WorkspaceStore {
    /// Open (creating if necessary) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Upsert a record by id.
    pub fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO workspaces (
                id, service_name, bucket, region, status, created_at_ms,
                started_at_ms, stopped_at_ms, last_activity_ms, shutdown_reason,
                editor_url, desktop_url, web_url, cpu_cores, memory_bytes,
                is_pre_warmed, user_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(id) DO UPDATE SET
                service_name = excluded.service_name,
                bucket = excluded.bucket,
                region = excluded.region,
                status = excluded.status,
                created_at_ms = excluded.created_at_ms,
                started_at_ms = excluded.started_at_ms,
                stopped_at_ms = excluded.stopped_at_ms,
                last_activity_ms = excluded.last_activity_ms,
                shutdown_reason = excluded.shutdown_reason,
                editor_url = excluded.editor_url,
                desktop_url = excluded.desktop_url,
                web_url = excluded.web_url,
                cpu_cores = excluded.cpu_cores,
                memory_bytes = excluded.memory_bytes,
                is_pre_warmed = excluded.is_pre_warmed,
                user_id = excluded.user_id",
            params![
                workspace.id.as_str(),
                workspace.service_name,
                workspace.bucket,
                workspace.region,
                workspace.status.as_str(),
                workspace.created_at_ms as i64,
                workspace.started_at_ms.map(|v| v as i64),
                workspace.stopped_at_ms.map(|v| v as i64),
                workspace.last_activity_ms.map(|v| v as i64),
                workspace.shutdown_reason.map(|r| r.as_str()),
                workspace.urls.editor,
                workspace.urls.desktop,
                workspace.urls.web,
                workspace.cpu_cores,
                workspace.memory_bytes as i64,
                workspace.is_pre_warmed as i64,
                workspace.user_id,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT * FROM workspaces WHERE id = ?1",
                params![id.as_str()],
                workspace_from_row,
            )
            .optional()?;
        row.transpose()
    }

    /// List records, newest first.
    pub fn list(&self, filter: ListFilter) -> Result<Vec<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let limit = filter.limit.map(i64::from).unwrap_or(-1);
        let offset = filter.offset.map(i64::from).unwrap_or(0);

        let mut out = Vec::new();
        match filter.status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM workspaces WHERE status = ?1
                     ORDER BY created_at_ms DESC LIMIT ?2 OFFSET ?3",
                )?;
                let rows =
                    stmt.query_map(params![status.as_str(), limit, offset], workspace_from_row)?;
                for row in rows {
                    out.push(row??);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM workspaces ORDER BY created_at_ms DESC LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt.query_map(params![limit, offset], workspace_from_row)?;
                for row in rows {
                    out.push(row??);
                }
            }
        }
        Ok(out)
    }

    /// Every record the health monitor should probe.
    pub fn list_active(&self) -> Result<Vec<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT * FROM workspaces WHERE status IN ('starting', 'running')
             ORDER BY created_at_ms DESC",
        )?;
        let rows = stmt.query_map([], workspace_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row??);
        }
        Ok(out)
    }

    /// Partial update of lifecycle fields. Returns false when no row matched.
    pub fn update_lifecycle(
        &self,
        id: &WorkspaceId,
        patch: LifecyclePatch,
    ) -> Result<bool, StoreError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = patch.status {
            sets.push("status = ?");
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(ms) = patch.started_at_ms {
            sets.push("started_at_ms = ?");
            values.push(Box::new(ms as i64));
        }
        if let Some(ms) = patch.stopped_at_ms {
            sets.push("stopped_at_ms = ?");
            values.push(Box::new(ms as i64));
        }
        if let Some(ms) = patch.last_activity_ms {
            sets.push("last_activity_ms = ?");
            values.push(Box::new(ms as i64));
        }
        if let Some(reason) = patch.shutdown_reason {
            sets.push("shutdown_reason = ?");
            values.push(Box::new(reason.as_str().to_string()));
        }
        if sets.is_empty() {
            return Ok(self.get(id)?.is_some());
        }

        let sql = format!("UPDATE workspaces SET {} WHERE id = ?", sets.join(", "));
        values.push(Box::new(id.as_str().to_string()));

        let conn = self.conn.lock();
        let changed = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: &WorkspaceId) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM workspaces WHERE id = ?1", params![id.as_str()])?;
        Ok(changed > 0)
    }

    pub fn count(&self, status: Option<WorkspaceStatus>) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = match status {
            Some(status) => conn.query_row(
                "SELECT COUNT(*) FROM workspaces WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM workspaces", [], |row| row.get(0))?,
        };
        Ok(count.max(0) as u64)
    }

    /// Move stopped records older than 24h into the archive relation.
    /// Returns how many rows moved.
    pub fn archive_old(&self, now_ms: u64) -> Result<usize, StoreError> {
        const DAY_MS: u64 = 24 * 60 * 60 * 1000;
        let cutoff = now_ms.saturating_sub(DAY_MS) as i64;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let moved = tx.execute(
            "INSERT OR REPLACE INTO workspaces_archive
             SELECT *, ?1 AS archived_at_ms FROM workspaces
             WHERE status = 'stopped' AND stopped_at_ms IS NOT NULL AND stopped_at_ms < ?2",
            params![now_ms as i64, cutoff],
        )?;
        tx.execute(
            "DELETE FROM workspaces
             WHERE status = 'stopped' AND stopped_at_ms IS NOT NULL AND stopped_at_ms < ?1",
            params![cutoff],
        )?;
        tx.commit()?;

        if moved > 0 {
            tracing::info!(moved, "archived stale stopped workspaces");
        }
        Ok(moved)
    }

    pub fn archived_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM workspaces_archive", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

/// Map a row to a record. Column order follows the schema.
fn workspace_from_row(row: &Row<'_>) -> Result<Result<Workspace, StoreError>, rusqlite::Error> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let reason_text: Option<String> = row.get("shutdown_reason")?;

    let id = match WorkspaceId::parse(&id_text) {
        Ok(id) => id,
        Err(e) => {
            return Ok(Err(StoreError::CorruptRow { id: id_text, reason: e.to_string() }))
        }
    };
    let Some(status) = WorkspaceStatus::parse(&status_text) else {
        return Ok(Err(StoreError::CorruptRow {
            id: id_text,
            reason: format!("unknown status {status_text:?}"),
        }));
    };
    let shutdown_reason = match reason_text {
        None => None,
        Some(text) => match ShutdownReason::parse(&text) {
            Some(reason) => Some(reason),
            None => {
                return Ok(Err(StoreError::CorruptRow {
                    id: id_text,
                    reason: format!("unknown shutdown reason {text:?}"),
                }))
            }
        },
    };

    Ok(Ok(Workspace {
        id,
        service_name: row.get("service_name")?,
        bucket: row.get("bucket")?,
        region: row.get("region")?,
        status,
        created_at_ms: row.get::<_, i64>("created_at_ms")?.max(0) as u64,
        started_at_ms: row.get::<_, Option<i64>>("started_at_ms")?.map(|v| v.max(0) as u64),
        stopped_at_ms: row.get::<_, Option<i64>>("stopped_at_ms")?.map(|v| v.max(0) as u64),
        last_activity_ms: row.get::<_, Option<i64>>("last_activity_ms")?.map(|v| v.max(0) as u64),
        shutdown_reason,
        urls: ServiceUrls {
            editor: row.get("editor_url")?,
            desktop: row.get("desktop_url")?,
            web: row.get("web_url")?,
        },
        cpu_cores: row.get("cpu_cores")?,
        memory_bytes: row.get::<_, i64>("memory_bytes")?.max(0) as u64,
        is_pre_warmed: row.get::<_, i64>("is_pre_warmed")? != 0,
        user_id: row.get("user_id")?,
    }))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

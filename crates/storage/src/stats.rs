// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle-stats rows.
//!
//! One row per workspace lifetime: appended at request time, updated once at
//! first-healthy and once at stop. The first-healthy update is guarded in
//! SQL (`WHERE code_editor_available_at_ms IS NULL`) so rapid successful
//! probes cannot double-write.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use idepool_core::{ShutdownReason, WorkspaceId};

use crate::schema;
use crate::store::StoreError;

/// One persisted stats row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRow {
    pub container_id: String,
    pub user_id: Option<String>,
    pub bucket: String,
    pub request_received_at_ms: u64,
    pub code_editor_available_at_ms: Option<u64>,
    pub stopped_at_ms: Option<u64>,
    pub startup_ms: Option<u64>,
    pub active_ms: Option<u64>,
    pub shutdown_reason: Option<String>,
}

/// Store for [`StatsRow`]s.
pub struct StatsStore {
    conn: Mutex<Connection>,
}

impl StatsStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        schema::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Append-once at request time. A second insert for the same id is
    /// ignored rather than clobbering the original request timestamp.
    pub fn insert_request(
        &self,
        id: &WorkspaceId,
        bucket: &str,
        user_id: Option<&str>,
        request_received_at_ms: u64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO workspace_stats
                (container_id, user_id, bucket, request_received_at_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![id.as_str(), user_id, bucket, request_received_at_ms as i64],
        )?;
        Ok(())
    }

    /// Record first-healthy. Returns true only for the write that actually
    /// landed, at most one per row.
    pub fn mark_editor_available(&self, id: &WorkspaceId, now_ms: u64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE workspace_stats
             SET code_editor_available_at_ms = ?2,
                 startup_ms = ?2 - request_received_at_ms
             WHERE container_id = ?1 AND code_editor_available_at_ms IS NULL",
            params![id.as_str(), now_ms as i64],
        )?;
        Ok(changed > 0)
    }

    /// Record stop. `active_ms` is measured from first-healthy, falling back
    /// to request time for workspaces that never became healthy.
    pub fn mark_stopped(
        &self,
        id: &WorkspaceId,
        now_ms: u64,
        reason: ShutdownReason,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE workspace_stats
             SET stopped_at_ms = ?2,
                 active_ms = ?2 - COALESCE(code_editor_available_at_ms, request_received_at_ms),
                 shutdown_reason = ?3
             WHERE container_id = ?1",
            params![id.as_str(), now_ms as i64, reason.as_str()],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &WorkspaceId) -> Result<Option<StatsRow>, StoreError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT container_id, user_id, bucket, request_received_at_ms,
                        code_editor_available_at_ms, stopped_at_ms, startup_ms,
                        active_ms, shutdown_reason
                 FROM workspace_stats WHERE container_id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(StatsRow {
                        container_id: row.get(0)?,
                        user_id: row.get(1)?,
                        bucket: row.get(2)?,
                        request_received_at_ms: row.get::<_, i64>(3)?.max(0) as u64,
                        code_editor_available_at_ms: row
                            .get::<_, Option<i64>>(4)?
                            .map(|v| v.max(0) as u64),
                        stopped_at_ms: row.get::<_, Option<i64>>(5)?.map(|v| v.max(0) as u64),
                        startup_ms: row.get::<_, Option<i64>>(6)?.map(|v| v.max(0) as u64),
                        active_ms: row.get::<_, Option<i64>>(7)?.map(|v| v.max(0) as u64),
                        shutdown_reason: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;

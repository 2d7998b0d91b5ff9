// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema creation. Idempotent: every statement is IF NOT EXISTS, so
//! opening an existing database is a no-op.

use rusqlite::Connection;

pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS workspaces (
    id                TEXT PRIMARY KEY,
    service_name      TEXT NOT NULL,
    bucket            TEXT NOT NULL DEFAULT '',
    region            TEXT NOT NULL DEFAULT '',
    status            TEXT NOT NULL,
    created_at_ms     INTEGER NOT NULL,
    started_at_ms     INTEGER,
    stopped_at_ms     INTEGER,
    last_activity_ms  INTEGER,
    shutdown_reason   TEXT,
    editor_url        TEXT NOT NULL,
    desktop_url       TEXT NOT NULL,
    web_url           TEXT NOT NULL,
    cpu_cores         REAL NOT NULL DEFAULT 0,
    memory_bytes      INTEGER NOT NULL DEFAULT 0,
    is_pre_warmed     INTEGER NOT NULL DEFAULT 0,
    user_id           TEXT
);

CREATE INDEX IF NOT EXISTS idx_workspaces_status ON workspaces (status);
CREATE INDEX IF NOT EXISTS idx_workspaces_stopped_at ON workspaces (stopped_at_ms);

CREATE TABLE IF NOT EXISTS workspaces_archive (
    id                TEXT PRIMARY KEY,
    service_name      TEXT NOT NULL,
    bucket            TEXT NOT NULL DEFAULT '',
    region            TEXT NOT NULL DEFAULT '',
    status            TEXT NOT NULL,
    created_at_ms     INTEGER NOT NULL,
    started_at_ms     INTEGER,
    stopped_at_ms     INTEGER,
    last_activity_ms  INTEGER,
    shutdown_reason   TEXT,
    editor_url        TEXT NOT NULL,
    desktop_url       TEXT NOT NULL,
    web_url           TEXT NOT NULL,
    cpu_cores         REAL NOT NULL DEFAULT 0,
    memory_bytes      INTEGER NOT NULL DEFAULT 0,
    is_pre_warmed     INTEGER NOT NULL DEFAULT 0,
    user_id           TEXT,
    archived_at_ms    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS workspace_stats (
    container_id                 TEXT PRIMARY KEY,
    user_id                      TEXT,
    bucket                       TEXT NOT NULL,
    request_received_at_ms       INTEGER NOT NULL,
    code_editor_available_at_ms  INTEGER,
    stopped_at_ms                INTEGER,
    startup_ms                   INTEGER,
    active_ms                    INTEGER,
    shutdown_reason              TEXT
);
";

pub(crate) fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}

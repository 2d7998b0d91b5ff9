// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry of pool members.
//!
//! The registry is the single serialization point for pool state: every
//! mutation runs under one mutex, so `claim_one` is a single critical
//! section: find a pre-warmed entry and mark it assigned before anyone
//! else can observe it. Two concurrent claims can never return the same
//! entry.

use std::collections::HashMap;

use parking_lot::Mutex;

use idepool_core::{QueueState, QueueStats, QueuedEntry, WorkspaceId};

/// Registry of pre-warmed pool members. Cheap to share; all methods take
/// `&self`.
pub struct QueueRegistry {
    entries: Mutex<HashMap<WorkspaceId, QueuedEntry>>,
    target: Mutex<usize>,
}

impl QueueRegistry {
    pub fn new(target: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), target: Mutex::new(target) }
    }

    /// Desired pool size; configuration-driven, adjustable at runtime.
    pub fn target(&self) -> usize {
        *self.target.lock()
    }

    pub fn set_target(&self, target: usize) {
        *self.target.lock() = target;
    }

    /// Atomically find any pre-warmed entry and mark it assigned.
    ///
    /// The returned entry is already `Assigned` with `assigned_at_ms` set;
    /// `None` means the pool is exhausted (a cheap outcome; callers fall
    /// back to a fresh launch).
    pub fn claim_one(&self, now_ms: u64) -> Option<QueuedEntry> {
        let mut entries = self.entries.lock();
        let id = entries
            .values()
            .find(|e| e.state == QueueState::PreWarmed)
            .map(|e| e.id.clone())?;
        let entry = entries.get_mut(&id)?;
        entry.state = QueueState::Assigned;
        entry.assigned_at_ms = Some(now_ms);
        Some(entry.clone())
    }

    /// Record the bucket on an already-assigned entry. Returns false when
    /// the entry is absent or not in `Assigned` state.
    pub fn bind_bucket(&self, id: &WorkspaceId, bucket: &str) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(id) {
            Some(entry) if entry.state == QueueState::Assigned => {
                entry.bucket = Some(bucket.to_string());
                true
            }
            _ => false,
        }
    }

    /// Roll an assigned entry back to pre-warmed, clearing the assignment.
    /// Used when an assignment aborts before the container was touched.
    pub fn return_to_pool(&self, id: &WorkspaceId) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(id) {
            if entry.state == QueueState::Assigned {
                entry.state = QueueState::PreWarmed;
                entry.assigned_at_ms = None;
                entry.bucket = None;
            }
        }
    }

    /// Mark an assigned entry as confirmed running.
    pub fn mark_running(&self, id: &WorkspaceId) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(id) {
            if entry.state == QueueState::Assigned {
                entry.state = QueueState::Running;
            }
        }
    }

    /// Add a pre-warmed entry. A duplicate id is left untouched.
    pub fn insert(&self, id: WorkspaceId, now_ms: u64) {
        let mut entries = self.entries.lock();
        entries.entry(id.clone()).or_insert_with(|| QueuedEntry::pre_warmed(id, now_ms));
    }

    /// Remove an entry regardless of state. Returns the removed entry.
    pub fn remove(&self, id: &WorkspaceId) -> Option<QueuedEntry> {
        self.entries.lock().remove(id)
    }

    pub fn contains(&self, id: &WorkspaceId) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn get(&self, id: &WorkspaceId) -> Option<QueuedEntry> {
        self.entries.lock().get(id).cloned()
    }

    /// Ids currently tracked, for runtime reconciliation.
    pub fn ids(&self) -> Vec<WorkspaceId> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Consistent snapshot of pool counts.
    pub fn stats(&self) -> QueueStats {
        let entries = self.entries.lock();
        let mut stats = QueueStats { target: *self.target.lock(), ..Default::default() };
        for entry in entries.values() {
            stats.total += 1;
            match entry.state {
                QueueState::PreWarmed => stats.pre_warmed += 1,
                QueueState::Assigned => stats.assigned += 1,
                QueueState::Running => stats.running += 1,
            }
        }
        stats
    }

    /// Spawns needed to reach the target.
    pub fn deficit(&self) -> usize {
        self.stats().deficit()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

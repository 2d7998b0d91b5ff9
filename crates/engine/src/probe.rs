// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource probe and launch admission.
//!
//! A point-in-time snapshot of host CPU/memory/disk plus the live workspace
//! count, and the admission decision derived from it: memory pressure
//! blocks new launches, CPU pressure only logs. Thresholds can be adjusted
//! while the daemon runs.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sysinfo::{Disks, System};

use idepool_storage::WorkspaceStore;

/// Point-in-time view of host resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_usage_pct: f32,
    pub cpu_cores: usize,
    pub mem_used: u64,
    pub mem_total: u64,
    pub mem_pct: f32,
    pub disk_used: u64,
    pub disk_total: u64,
    pub disk_pct: f32,
    /// Workspaces in `starting` or `running` per the store
    pub live_workspaces: u64,
}

/// Outcome of the admission gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl AdmissionDecision {
    pub fn allow() -> Self {
        Self { allowed: true, reason: None }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: Some(reason.into()) }
    }
}

/// Admission gate for new workspace launches.
pub trait Admission: Send + Sync {
    fn snapshot(&self) -> ResourceSnapshot;
    fn can_launch(&self) -> AdmissionDecision;
}

struct Thresholds {
    mem_pct: f32,
    cpu_pct: f32,
}

/// Host-backed resource probe.
pub struct ResourceProbe {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    thresholds: Mutex<Thresholds>,
    store: Arc<WorkspaceStore>,
}

impl ResourceProbe {
    pub fn new(store: Arc<WorkspaceStore>, mem_threshold_pct: f32, cpu_threshold_pct: f32) -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            thresholds: Mutex::new(Thresholds {
                mem_pct: mem_threshold_pct,
                cpu_pct: cpu_threshold_pct,
            }),
            store,
        }
    }

    pub fn set_mem_threshold_pct(&self, pct: f32) {
        self.thresholds.lock().mem_pct = pct;
    }

    pub fn set_cpu_threshold_pct(&self, pct: f32) {
        self.thresholds.lock().cpu_pct = pct;
    }

    fn live_workspaces(&self) -> u64 {
        // Store failures only degrade the reported count, never the probe.
        self.store.list_active().map(|active| active.len() as u64).unwrap_or(0)
    }
}

impl Admission for ResourceProbe {
    fn snapshot(&self) -> ResourceSnapshot {
        let (cpu_usage_pct, cpu_cores, mem_used, mem_total) = {
            let mut system = self.system.lock();
            system.refresh_memory();
            system.refresh_cpu_usage();
            (
                system.global_cpu_info().cpu_usage(),
                system.cpus().len(),
                system.used_memory(),
                system.total_memory(),
            )
        };

        let (disk_used, disk_total) = {
            let mut disks = self.disks.lock();
            disks.refresh();
            disks.list().iter().fold((0u64, 0u64), |(used, total), disk| {
                let space = disk.total_space();
                (used + space.saturating_sub(disk.available_space()), total + space)
            })
        };

        ResourceSnapshot {
            cpu_usage_pct,
            cpu_cores,
            mem_used,
            mem_total,
            mem_pct: pct(mem_used, mem_total),
            disk_used,
            disk_total,
            disk_pct: pct(disk_used, disk_total),
            live_workspaces: self.live_workspaces(),
        }
    }

    fn can_launch(&self) -> AdmissionDecision {
        let snapshot = self.snapshot();
        let (mem_threshold, cpu_threshold) = {
            let thresholds = self.thresholds.lock();
            (thresholds.mem_pct, thresholds.cpu_pct)
        };
        admission_decision(&snapshot, mem_threshold, cpu_threshold)
    }
}

/// Pure decision over a snapshot: memory blocks, CPU only logs.
pub(crate) fn admission_decision(
    snapshot: &ResourceSnapshot,
    mem_threshold_pct: f32,
    cpu_threshold_pct: f32,
) -> AdmissionDecision {
    if snapshot.mem_pct >= mem_threshold_pct {
        return AdmissionDecision::deny(format!(
            "memory usage {:.1}% at or above threshold {:.1}%",
            snapshot.mem_pct, mem_threshold_pct
        ));
    }
    if snapshot.cpu_usage_pct >= cpu_threshold_pct {
        tracing::warn!(
            cpu_usage_pct = snapshot.cpu_usage_pct,
            threshold = cpu_threshold_pct,
            "cpu usage above threshold, allowing launch anyway"
        );
    }
    AdmissionDecision::allow()
}

fn pct(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

/// Fixed-outcome gate for tests.
#[cfg(any(test, feature = "test-support"))]
pub struct FixedAdmission {
    decision: Mutex<AdmissionDecision>,
    snapshot: Mutex<ResourceSnapshot>,
}

#[cfg(any(test, feature = "test-support"))]
impl FixedAdmission {
    pub fn allowing() -> Self {
        Self {
            decision: Mutex::new(AdmissionDecision::allow()),
            snapshot: Mutex::new(ResourceSnapshot::default()),
        }
    }

    pub fn denying(reason: &str) -> Self {
        let gate = Self::allowing();
        gate.set_decision(AdmissionDecision::deny(reason));
        gate
    }

    pub fn set_decision(&self, decision: AdmissionDecision) {
        *self.decision.lock() = decision;
    }

    pub fn set_snapshot(&self, snapshot: ResourceSnapshot) {
        *self.snapshot.lock() = snapshot;
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Admission for FixedAdmission {
    fn snapshot(&self) -> ResourceSnapshot {
        *self.snapshot.lock()
    }

    fn can_launch(&self) -> AdmissionDecision {
        self.decision.lock().clone()
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;

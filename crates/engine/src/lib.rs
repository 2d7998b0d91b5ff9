// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! idepool-engine: the workspace lifecycle control plane.
//!
//! Several concurrent actors share one fleet: the assignment handler serves
//! client requests, while three background loops keep the pool topped up
//! (maintainer), flip health statuses (monitor), and reconcile the durable
//! store against the live runtime (reaper). All cross-actor state lives in
//! the queue registry and the persistent store; everything else talks
//! through the adapter traits.

pub mod assign;
pub mod fleet;
pub mod health;
pub mod loops;
pub mod maintainer;
pub mod probe;
pub mod registry;
pub mod reaper;
pub mod stats;

pub use assign::{AssignError, AssignRequest, Assignment, AssignmentHandler, AssignmentSettings};
pub use fleet::{Fleet, FleetDeps};
pub use health::{EndpointProber, HealthMonitor, HealthSummary, HttpProber, ProbeOutcome};
pub use loops::{spawn_loop, LoopHeartbeats};
pub use maintainer::{MaintainerSettings, QueueMaintainer};
pub use probe::{Admission, AdmissionDecision, ResourceProbe, ResourceSnapshot};
pub use registry::QueueRegistry;
pub use reaper::CleanupReaper;
pub use stats::LifecycleStats;

#[cfg(any(test, feature = "test-support"))]
pub use health::ScriptedProber;
#[cfg(any(test, feature = "test-support"))]
pub use probe::FixedAdmission;

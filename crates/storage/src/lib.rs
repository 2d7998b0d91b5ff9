// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! idepool-storage: the durable record of every workspace ever created.
//!
//! A single SQLite file holds the `workspaces` table, its archive relation,
//! and the lifecycle-stats rows. Writes serialize behind one connection;
//! operations are short and local, so no lock is held across I/O to other
//! systems.

mod schema;
mod stats;
mod store;

pub use stats::{StatsRow, StatsStore};
pub use store::{LifecyclePatch, ListFilter, StoreError, WorkspaceStore};

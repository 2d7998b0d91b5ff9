// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! idepool-adapters: boundary adapters for the workspace fleet.
//!
//! The control plane drives the container runtime and the object-storage
//! boundary exclusively through the traits here, so the engine can be tested
//! against in-memory fakes and the daemon can swap runtimes without touching
//! control logic.

pub mod bucket;
pub mod orchestrator;

pub use bucket::{BucketAccessError, BucketCheck, BucketValidator, S3BucketValidator};
pub use orchestrator::{
    CreateOptions, CreatedService, DockerOrchestrator, Orchestrator, OrchestratorError,
    ServiceRecord, StopOutcome,
};

#[cfg(any(test, feature = "test-support"))]
pub use bucket::StaticBucketValidator;
#[cfg(any(test, feature = "test-support"))]
pub use orchestrator::{FakeOrchestrator, OrchestratorCall};

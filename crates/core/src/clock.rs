// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so lifecycle timing is testable.
//!
//! Timestamps are epoch milliseconds (what the store persists); `now()` gives
//! a monotonic instant for measuring elapsed time inside a process.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A source of wall-clock and monotonic time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Controllable clock for tests. Starts at a fixed epoch and only moves when
/// advanced.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockInner>>,
}

struct FakeClockInner {
    base: Instant,
    offset: Duration,
    epoch_ms: u64,
}

impl FakeClock {
    /// Default test epoch: 2026-01-01T00:00:00Z.
    pub const DEFAULT_EPOCH_MS: u64 = 1_767_225_600_000;

    pub fn new() -> Self {
        Self::at_epoch_ms(Self::DEFAULT_EPOCH_MS)
    }

    pub fn at_epoch_ms(epoch_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockInner {
                base: Instant::now(),
                offset: Duration::ZERO,
                epoch_ms,
            })),
        }
    }

    /// Move both the monotonic and wall clock forward.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock();
        inner.offset += by;
        inner.epoch_ms += by.as_millis() as u64;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let inner = self.inner.lock();
        inner.base + inner.offset
    }

    fn epoch_ms(&self) -> u64 {
        self.inner.lock().epoch_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background loop driver.
//!
//! Every control-plane loop is a dedicated long-lived task with a fixed
//! cadence and a stop signal: tick, heartbeat, sleep-or-cancel. The stop
//! signal is only observed between iterations, so an in-flight tick always
//! completes its boundary calls before the task exits. Re-entrancy is the
//! tick's own concern (each component holds a try-lock guard); the driver
//! never starts a tick before the previous one returned.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use idepool_core::Clock;

/// Last-tick timestamps per loop, for operator status.
#[derive(Clone, Default)]
pub struct LoopHeartbeats {
    inner: Arc<Mutex<HashMap<&'static str, u64>>>,
}

impl LoopHeartbeats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beat(&self, name: &'static str, now_ms: u64) {
        self.inner.lock().insert(name, now_ms);
    }

    pub fn last_beat_ms(&self, name: &str) -> Option<u64> {
        self.inner.lock().get(name).copied()
    }

    pub fn all(&self) -> Vec<(String, u64)> {
        let mut beats: Vec<(String, u64)> =
            self.inner.lock().iter().map(|(name, ms)| (name.to_string(), *ms)).collect();
        beats.sort();
        beats
    }
}

/// Spawn a background loop that ticks until the token fires.
pub fn spawn_loop<C, F, Fut>(
    name: &'static str,
    period: Duration,
    token: CancellationToken,
    heartbeats: LoopHeartbeats,
    clock: C,
    tick: F,
) -> JoinHandle<()>
where
    C: Clock,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        tracing::info!(loop_name = name, period_secs = period.as_secs_f64(), "background loop started");
        loop {
            tick().await;
            heartbeats.beat(name, clock.epoch_ms());

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(period) => {}
            }
        }
        tracing::info!(loop_name = name, "background loop stopped");
    })
}

#[cfg(test)]
#[path = "loops_tests.rs"]
mod tests;

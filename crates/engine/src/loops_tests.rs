// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use idepool_core::FakeClock;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn loop_ticks_until_cancelled() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let token = CancellationToken::new();
    let heartbeats = LoopHeartbeats::new();

    let counter = Arc::clone(&ticks);
    let handle = spawn_loop(
        "test",
        Duration::from_millis(1),
        token.clone(),
        heartbeats.clone(),
        FakeClock::new(),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        },
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    handle.await.unwrap();

    let total = ticks.load(Ordering::SeqCst);
    assert!(total >= 2, "expected several ticks, got {total}");
    assert!(heartbeats.last_beat_ms("test").is_some());
}

#[tokio::test]
async fn cancel_waits_for_the_inflight_tick() {
    let finished = Arc::new(AtomicUsize::new(0));
    let token = CancellationToken::new();

    let counter = Arc::clone(&finished);
    let handle = spawn_loop(
        "slow",
        Duration::from_secs(3600),
        token.clone(),
        LoopHeartbeats::new(),
        FakeClock::new(),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        },
    );

    // Cancel while the first tick is (likely) still sleeping.
    tokio::time::sleep(Duration::from_millis(5)).await;
    token.cancel();
    handle.await.unwrap();

    assert_eq!(finished.load(Ordering::SeqCst), 1, "in-flight tick ran to completion");
}

#[tokio::test]
async fn heartbeats_report_all_loops() {
    let heartbeats = LoopHeartbeats::new();
    heartbeats.beat("cleanup", 10);
    heartbeats.beat("health", 20);
    heartbeats.beat("health", 30);

    assert_eq!(heartbeats.last_beat_ms("health"), Some(30));
    assert_eq!(
        heartbeats.all(),
        vec![("cleanup".to_string(), 10), ("health".to_string(), 30)]
    );
    assert_eq!(heartbeats.last_beat_ms("queue"), None);
}

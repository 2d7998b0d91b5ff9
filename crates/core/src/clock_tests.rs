// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_at_default_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), FakeClock::DEFAULT_EPOCH_MS);
}

#[test]
fn advance_moves_both_clocks_together() {
    let clock = FakeClock::at_epoch_ms(1_000);
    let before = clock.now();
    clock.advance(Duration::from_secs(90));
    assert_eq!(clock.epoch_ms(), 91_000);
    assert_eq!(clock.now().duration_since(before), Duration::from_secs(90));
}

#[test]
fn clones_share_the_same_time() {
    let clock = FakeClock::at_epoch_ms(0);
    let other = clock.clone();
    clock.advance(Duration::from_millis(250));
    assert_eq!(other.epoch_ms(), 250);
}

#[test]
fn system_clock_epoch_is_sane() {
    // Anything after 2020 counts as sane for a wall clock.
    assert!(SystemClock.epoch_ms() > 1_577_836_800_000);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn id(token: &str) -> WorkspaceId {
    WorkspaceId::parse(token).unwrap()
}

#[test]
fn request_row_is_append_once() {
    let stats = StatsStore::open_in_memory().unwrap();
    let id = id("abcd1234");

    stats.insert_request(&id, "data", Some("u-1"), 1_000).unwrap();
    stats.insert_request(&id, "other", None, 9_999).unwrap();

    let row = stats.get(&id).unwrap().unwrap();
    assert_eq!(row.bucket, "data");
    assert_eq!(row.request_received_at_ms, 1_000);
    assert_eq!(row.user_id.as_deref(), Some("u-1"));
}

#[test]
fn editor_available_lands_exactly_once() {
    let stats = StatsStore::open_in_memory().unwrap();
    let id = id("abcd1234");
    stats.insert_request(&id, "data", None, 1_000).unwrap();

    assert!(stats.mark_editor_available(&id, 4_500).unwrap());
    // Rapid follow-up probes must not move the timestamp.
    assert!(!stats.mark_editor_available(&id, 9_000).unwrap());

    let row = stats.get(&id).unwrap().unwrap();
    assert_eq!(row.code_editor_available_at_ms, Some(4_500));
    assert_eq!(row.startup_ms, Some(3_500));
}

#[test]
fn stop_measures_active_from_first_healthy() {
    let stats = StatsStore::open_in_memory().unwrap();
    let id = id("abcd1234");
    stats.insert_request(&id, "data", None, 1_000).unwrap();
    stats.mark_editor_available(&id, 2_000).unwrap();
    stats.mark_stopped(&id, 62_000, idepool_core::ShutdownReason::Inactivity).unwrap();

    let row = stats.get(&id).unwrap().unwrap();
    assert_eq!(row.stopped_at_ms, Some(62_000));
    assert_eq!(row.active_ms, Some(60_000));
    assert_eq!(row.shutdown_reason.as_deref(), Some("inactivity"));
}

#[test]
fn stop_falls_back_to_request_time_when_never_healthy() {
    let stats = StatsStore::open_in_memory().unwrap();
    let id = id("abcd1234");
    stats.insert_request(&id, "data", None, 1_000).unwrap();
    stats.mark_stopped(&id, 5_000, idepool_core::ShutdownReason::Error).unwrap();

    let row = stats.get(&id).unwrap().unwrap();
    assert_eq!(row.active_ms, Some(4_000));
    assert!(row.code_editor_available_at_ms.is_none());
}

#[test]
fn marking_an_unknown_id_is_harmless() {
    let stats = StatsStore::open_in_memory().unwrap();
    assert!(!stats.mark_editor_available(&id("zzzz9999"), 1_000).unwrap());
    stats.mark_stopped(&id("zzzz9999"), 1_000, idepool_core::ShutdownReason::Manual).unwrap();
}

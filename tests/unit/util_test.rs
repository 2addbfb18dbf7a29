//! Tests for shared utilities

use hall_dispatch::util::clock::{now_ms, Clock, ManualClock, SystemClock};
use hall_dispatch::util::serde::{ReminderId, TaskId, WorkerId};

#[test]
fn test_ids_are_unique() {
    assert_ne!(TaskId::new(), TaskId::new());
    assert_ne!(WorkerId::new(), WorkerId::new());
    assert_ne!(ReminderId::new(), ReminderId::new());
}

#[test]
fn test_ids_serialize_transparently() {
    let id = TaskId::new();
    let json = serde_json::to_value(id).unwrap();
    assert_eq!(json, serde_json::json!(id.as_uuid().to_string()));

    let back: TaskId = serde_json::from_value(json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn test_id_display_matches_uuid() {
    let id = WorkerId::new();
    assert_eq!(format!("{id}"), id.as_uuid().to_string());
}

#[test]
fn test_now_ms_is_after_2020() {
    // 2020-01-01 in ms since epoch.
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_system_clock_tracks_wall_time() {
    let clock = SystemClock;
    let before = now_ms();
    let at = clock.now_ms();
    assert!(at >= before);
}

#[test]
fn test_manual_clock_is_deterministic() {
    let clock = ManualClock::new(500);
    assert_eq!(clock.now_ms(), 500);
    clock.advance(100);
    assert_eq!(clock.now_ms(), 600);
    clock.set(10_000);
    assert_eq!(clock.now_ms(), 10_000);
}

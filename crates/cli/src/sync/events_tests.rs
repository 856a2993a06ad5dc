// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn event(n: u64) -> SyncEvent {
    SyncEvent::success(RecordId::new(n, 0), format!("items/{n}"))
}

#[test]
fn every_listener_receives_each_event() {
    let registry = ListenerRegistry::new(4, 8);
    let mut a = registry.subscribe().unwrap();
    let mut b = registry.subscribe().unwrap();

    registry.publish(&event(1));

    assert_eq!(a.try_recv().unwrap(), event(1));
    assert_eq!(b.try_recv().unwrap(), event(1));
}

#[test]
fn subscribe_fails_when_full() {
    let registry = ListenerRegistry::new(1, 8);
    let _first = registry.subscribe().unwrap();

    assert!(registry.subscribe().is_none());
}

#[test]
fn dropped_listener_frees_its_slot() {
    let registry = ListenerRegistry::new(1, 8);
    let first = registry.subscribe().unwrap();
    drop(first);

    let second = registry.subscribe();
    assert!(second.is_some());
    assert_eq!(registry.len(), 1);
}

#[test]
fn full_listener_drops_events_without_blocking() {
    let registry = ListenerRegistry::new(2, 1);
    let mut slow = registry.subscribe().unwrap();

    registry.publish(&event(1));
    registry.publish(&event(2));

    assert_eq!(slow.try_recv().unwrap(), event(1));
    assert!(slow.try_recv().is_err());
    assert_eq!(registry.len(), 1);
}

#[test]
fn closed_listeners_are_pruned_on_publish() {
    let registry = ListenerRegistry::new(2, 1);
    let keep = registry.subscribe().unwrap();
    drop(registry.subscribe().unwrap());

    registry.publish(&event(1));

    assert_eq!(registry.len(), 1);
    drop(keep);
    assert!(registry.is_empty());
}

#[test]
fn terminal_failure_json_has_detail() {
    let event = SyncEvent::terminal_failure(RecordId::new(9, 1), "items/9", "permission denied");
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["outcome"], "terminal_failure");
    assert_eq!(json["detail"], "permission denied");
    assert_eq!(json["record_id"]["wall_ms"], 9);
}

#[test]
fn success_json_omits_detail() {
    let json = serde_json::to_string(&event(3)).unwrap();
    assert!(json.contains("\"outcome\":\"success\""));
    assert!(!json.contains("detail"));
}

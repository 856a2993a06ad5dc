// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use outbox_core::RecordId;
use tempfile::TempDir;

#[test]
fn test_format_success() {
    let event = SyncEvent::success(RecordId::new(1700000000000, 2), "items/1");
    assert_eq!(format_event(&event), "applied  1700000000000-2  items/1");
}

#[test]
fn test_format_terminal_failure() {
    let event = SyncEvent::terminal_failure(RecordId::new(5, 0), "items/1", "validation: bad");
    assert_eq!(format_event(&event), "failed   5-0  items/1: validation: bad");
}

#[test]
fn test_context_loads_config_from_state_dir() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("outbox.toml"), "[remote]\nurl = \"ws://10.1.2.3:9000\"\n")
        .unwrap();

    let ctx = Context::load(temp.path().to_path_buf()).unwrap();

    assert_eq!(ctx.config.remote.url, "ws://10.1.2.3:9000");
    assert_eq!(ctx.probe().unwrap().addr(), "10.1.2.3:9000");
}

#[test]
fn test_open_queue_holds_the_lock() {
    let temp = TempDir::new().unwrap();
    let ctx = Context::load(temp.path().to_path_buf()).unwrap();

    let _queue = ctx.open_queue().unwrap();
    assert!(ctx.open_queue().is_err());
}

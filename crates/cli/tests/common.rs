// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `outbox` bound to `temp` as its state directory.
pub fn outbox(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("outbox");
    cmd.arg("--state-dir").arg(temp.path()).env_remove("OUTBOX_STATE_DIR");
    cmd
}

/// Submits an apply and returns the printed record id.
pub fn submit(temp: &TempDir, path: &str, json: &str) -> String {
    let output = outbox(temp)
        .args(["submit", path, "--json", json])
        .output()
        .unwrap();
    assert!(output.status.success(), "submit failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Points the probe at a local port nothing listens on.
pub fn write_unreachable_config(temp: &TempDir) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = format!(
        "[remote]\nurl = \"ws://127.0.0.1:{port}\"\n\n[probe]\naddr = \"127.0.0.1:{port}\"\ntimeout_ms = 500\n"
    );
    std::fs::write(temp.path().join("outbox.toml"), config).unwrap();
}

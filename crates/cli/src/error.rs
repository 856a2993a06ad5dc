// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{StoreError, SyncError};

/// All possible errors that can occur in the outbox library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("cannot determine state directory\n  hint: pass --state-dir or set OUTBOX_STATE_DIR")]
    NoStateDir,

    #[error("invalid payload: {0}\n  hint: --json takes a JSON value, e.g. --json '{{\"title\": \"x\"}}'")]
    InvalidPayload(String),

    #[error("{0}")]
    Core(#[from] outbox_core::Error),

    #[error("queue store error: {0}")]
    Store(#[from] StoreError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A specialized Result type for outbox operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

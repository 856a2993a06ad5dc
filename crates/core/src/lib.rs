// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outbox-core: shared types for the outbox mutation queue.
//!
//! This crate provides the mutation record model, record identifiers, path
//! validation, the remote store wire protocol, and JSONL persistence helpers
//! used by the `outbox` sync layer.

pub mod error;
pub mod id;
pub mod jsonl;
pub mod path;
pub mod protocol;
pub mod record;

pub use error::{Error, Result};
pub use id::{ClockSource, IdGenerator, RecordId, SystemClock};
pub use path::{is_valid_path, validate_path};
pub use protocol::{ClientMessage, RejectCode, ServerMessage};
pub use record::{Mutation, MutationKind, MutationRecord};

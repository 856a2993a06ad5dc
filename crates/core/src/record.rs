// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mutation intents and the queued records that carry them.
//!
//! A [`Mutation`] is what the application asks for: set or delete the value
//! at a path. Once accepted by the queue it becomes a [`MutationRecord`],
//! stamped with an id and enqueue time and tracked until the remote store
//! confirms it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::id::RecordId;

/// The kind of change a mutation makes at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Overwrite the value at the path with the payload (no partial merge).
    Apply,
    /// Remove the value at the path.
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Apply => "apply",
            MutationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "apply" | "set" | "update" => Ok(MutationKind::Apply),
            "delete" | "remove" => Ok(MutationKind::Delete),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// A requested change to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Slash-delimited target path.
    pub path: String,
    pub kind: MutationKind,
    /// New value for `apply`; always `None` for `delete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Mutation {
    /// Creates a mutation, checking that `apply` carries a payload.
    ///
    /// A payload passed with `delete` is discarded.
    pub fn new(path: impl Into<String>, kind: MutationKind, payload: Option<Value>) -> Result<Self> {
        let path = path.into();
        match kind {
            MutationKind::Apply => match payload {
                Some(payload) => Ok(Mutation::apply(path, payload)),
                None => Err(Error::MissingPayload(path)),
            },
            MutationKind::Delete => Ok(Mutation::delete(path)),
        }
    }

    /// Creates an `apply` mutation.
    pub fn apply(path: impl Into<String>, payload: Value) -> Self {
        Mutation { path: path.into(), kind: MutationKind::Apply, payload: Some(payload) }
    }

    /// Creates a `delete` mutation.
    pub fn delete(path: impl Into<String>) -> Self {
        Mutation { path: path.into(), kind: MutationKind::Delete, payload: None }
    }
}

/// A mutation accepted into the queue, awaiting remote confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub id: RecordId,
    /// Milliseconds since Unix epoch; diagnostics and tie-breaks only.
    pub enqueued_at: u64,
    /// Retryable failures seen so far.
    #[serde(default)]
    pub attempts: u32,
    #[serde(flatten)]
    pub mutation: Mutation,
}

impl MutationRecord {
    /// Wraps a mutation with its queue identity.
    pub fn new(id: RecordId, mutation: Mutation) -> Self {
        MutationRecord { id, enqueued_at: id.wall_ms, attempts: 0, mutation }
    }

    pub fn path(&self) -> &str {
        &self.mutation.path
    }

    pub fn kind(&self) -> MutationKind {
        self.mutation.kind
    }

    pub fn payload(&self) -> Option<&Value> {
        self.mutation.payload.as_ref()
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;

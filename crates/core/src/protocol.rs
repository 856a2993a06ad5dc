// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wire messages exchanged with the remote store.
//!
//! The protocol is request/response over a single connection:
//! - Client sends `apply`/`delete` requests tagged with a `request_id`
//! - Server answers each request with `ack` or `rejected` carrying the same id
//!
//! A `rejected` reply carries a [`RejectCode`] that tells the client whether
//! sending the same request again could succeed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{MutationKind, MutationRecord};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Overwrite the value at `path`.
    Apply { request_id: u64, path: String, payload: Value },

    /// Remove the value at `path`.
    Delete { request_id: u64, path: String },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The request was applied.
    Ack { request_id: u64 },

    /// The request was refused.
    Rejected { request_id: u64, code: RejectCode, message: String },

    /// Pong response to client Ping.
    Pong { id: u64 },

    /// Connection-level error not tied to a request.
    Error { message: String },
}

/// Reason a request was refused by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectCode {
    /// Store temporarily unavailable.
    Unavailable,
    /// Store timed out applying the request.
    Timeout,
    /// Unexpected server-side failure.
    Internal,
    /// Path is malformed.
    InvalidPath,
    /// Payload failed validation.
    Validation,
    /// Caller is not allowed to write the path.
    PermissionDenied,
}

impl RejectCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectCode::Unavailable => "unavailable",
            RejectCode::Timeout => "timeout",
            RejectCode::Internal => "internal",
            RejectCode::InvalidPath => "invalid_path",
            RejectCode::Validation => "validation",
            RejectCode::PermissionDenied => "permission_denied",
        }
    }

    /// Returns true if resending the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RejectCode::Unavailable | RejectCode::Timeout | RejectCode::Internal)
    }
}

impl fmt::Display for RejectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ClientMessage {
    /// Builds the request for a mutation at `path`.
    ///
    /// An `apply` without a payload is sent as an explicit `null` value.
    pub fn request(
        request_id: u64,
        path: &str,
        kind: MutationKind,
        payload: Option<&Value>,
    ) -> Self {
        let path = path.to_string();
        match kind {
            MutationKind::Apply => ClientMessage::Apply {
                request_id,
                path,
                payload: payload.cloned().unwrap_or(Value::Null),
            },
            MutationKind::Delete => ClientMessage::Delete { request_id, path },
        }
    }

    /// Builds the request for a queued mutation.
    pub fn for_record(request_id: u64, record: &MutationRecord) -> Self {
        Self::request(request_id, record.path(), record.kind(), record.payload())
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Request id this message expects a reply for, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ClientMessage::Apply { request_id, .. } | ClientMessage::Delete { request_id, .. } => {
                Some(*request_id)
            }
            ClientMessage::Ping { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Ack message.
    pub fn ack(request_id: u64) -> Self {
        ServerMessage::Ack { request_id }
    }

    /// Creates a Rejected message.
    pub fn rejected(request_id: u64, code: RejectCode, message: impl Into<String>) -> Self {
        ServerMessage::Rejected { request_id, code, message: message.into() }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    /// Request id this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Ack { request_id } | ServerMessage::Rejected { request_id, .. } => {
                Some(*request_id)
            }
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

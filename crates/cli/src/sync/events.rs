// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resolution events delivered to application listeners.
//!
//! Each queued record resolves exactly once, either applied remotely or
//! dropped as a terminal failure. Listeners receive these through bounded
//! channels; a listener that falls behind misses events rather than stalling
//! the drain.

use std::sync::Mutex;

use outbox_core::RecordId;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

/// How a record was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Applied by the remote store and removed from the queue.
    Success,
    /// Dropped without being applied; it will not be retried.
    TerminalFailure,
}

/// A record resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub record_id: RecordId,
    pub path: String,
    pub outcome: Outcome,
    /// Failure description for terminal failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyncEvent {
    pub fn success(record_id: RecordId, path: impl Into<String>) -> Self {
        SyncEvent { record_id, path: path.into(), outcome: Outcome::Success, detail: None }
    }

    pub fn terminal_failure(
        record_id: RecordId,
        path: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        SyncEvent {
            record_id,
            path: path.into(),
            outcome: Outcome::TerminalFailure,
            detail: Some(detail.into()),
        }
    }
}

/// Bounded set of event listeners.
pub struct ListenerRegistry {
    listeners: Mutex<Vec<mpsc::Sender<SyncEvent>>>,
    max_listeners: usize,
    capacity: usize,
}

impl ListenerRegistry {
    /// Creates a registry holding at most `max_listeners` listeners, each
    /// buffering up to `capacity` undelivered events.
    pub fn new(max_listeners: usize, capacity: usize) -> Self {
        ListenerRegistry {
            listeners: Mutex::new(Vec::new()),
            max_listeners,
            capacity: capacity.max(1),
        }
    }

    /// Registers a listener. Returns `None` when the registry is full.
    ///
    /// Dropped receivers are pruned first, so their slots are reusable.
    pub fn subscribe(&self) -> Option<mpsc::Receiver<SyncEvent>> {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|tx| !tx.is_closed());
        if listeners.len() >= self.max_listeners {
            return None;
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        listeners.push(tx);
        Some(rx)
    }

    /// Delivers an event to every listener without blocking.
    pub fn publish(&self, event: &SyncEvent) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("listener full, dropped event for {}", event.record_id);
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.iter().filter(|tx| !tx.is_closed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the remote store.
//!
//! [`RemoteStore`] is the narrow interface the sync engine drains through:
//! apply one mutation, get back a classified [`ApplyOutcome`]. The engine
//! acts on that classification verbatim, so this is the only place that
//! decides whether a failure is worth retrying.
//!
//! [`WebSocketRemote`] implements it over a [`Transport`], connecting lazily
//! and reconnecting with exponential backoff.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use outbox_core::{validate_path, ClientMessage, MutationKind, ServerMessage};
use serde_json::Value;

use super::transport::{Transport, TransportError, TransportResult, WebSocketTransport};

/// Result of applying one mutation at the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The remote store applied the mutation.
    Applied,
    /// Failed, but the same request may succeed later.
    Retryable(String),
    /// Failed permanently; resending cannot help.
    Terminal(String),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }

    /// Failure description, if this is a failure.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApplyOutcome::Applied => None,
            ApplyOutcome::Retryable(detail) | ApplyOutcome::Terminal(detail) => Some(detail),
        }
    }
}

/// Applies mutations at the remote store.
pub trait RemoteStore: Send + Sync {
    /// Applies `kind` at `path`. `payload` is present for applies.
    fn apply<'a>(
        &'a self,
        path: &'a str,
        kind: MutationKind,
        payload: Option<&'a Value>,
    ) -> Pin<Box<dyn Future<Output = ApplyOutcome> + Send + 'a>>;
}

impl<R: RemoteStore + ?Sized> RemoteStore for Arc<R> {
    fn apply<'a>(
        &'a self,
        path: &'a str,
        kind: MutationKind,
        payload: Option<&'a Value>,
    ) -> Pin<Box<dyn Future<Output = ApplyOutcome> + Send + 'a>> {
        (**self).apply(path, kind, payload)
    }
}

/// Configuration for the remote store client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL of the remote store.
    pub url: String,
    /// How long to wait for the reply to one request.
    pub request_timeout: Duration,
    /// Connection attempts per request before giving up.
    pub max_retries: u32,
    /// Initial delay for exponential backoff (milliseconds).
    pub initial_delay_ms: u64,
    /// Maximum delay between connection attempts (seconds).
    pub max_delay_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            url: "ws://localhost:7890".to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_secs: 30,
        }
    }
}

/// State of the client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Attempting to connect.
    Connecting,
    /// Connected to the remote store.
    Connected,
    /// Reconnecting after a failed attempt.
    Reconnecting { attempt: u32 },
}

/// Connection plus per-connection bookkeeping.
struct Link<T> {
    transport: T,
    next_request_id: u64,
    state: ConnectionState,
}

impl<T: Transport> Link<T> {
    /// Connect with exponential backoff retry.
    async fn connect_with_retry(&mut self, config: &ClientConfig) -> TransportResult<()> {
        let max_delay_ms = config.max_delay_secs.saturating_mul(1000);
        let mut attempt = 0;
        let mut delay_ms = config.initial_delay_ms;

        loop {
            attempt += 1;
            self.state = if attempt == 1 {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting { attempt }
            };

            match self.transport.connect(&config.url).await {
                Ok(()) => {
                    self.state = ConnectionState::Connected;
                    return Ok(());
                }
                Err(e) if attempt >= config.max_retries.max(1) => {
                    self.state = ConnectionState::Disconnected;
                    tracing::debug!("giving up on {} after {} attempts", config.url, attempt);
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!("connect attempt {} to {} failed: {}", attempt, config.url, e);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = std::cmp::min(delay_ms.saturating_mul(2), max_delay_ms);
                }
            }
        }
    }

    async fn drop_connection(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            tracing::debug!("disconnect failed: {}", e);
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Reads until the reply for `request_id` arrives.
    async fn await_reply(&mut self, request_id: u64) -> TransportResult<ApplyOutcome> {
        loop {
            match self.transport.recv().await? {
                Some(ServerMessage::Ack { request_id: id }) if id == request_id => {
                    return Ok(ApplyOutcome::Applied);
                }
                Some(ServerMessage::Rejected { request_id: id, code, message })
                    if id == request_id =>
                {
                    let detail = format!("{code}: {message}");
                    return Ok(if code.is_retryable() {
                        ApplyOutcome::Retryable(detail)
                    } else {
                        ApplyOutcome::Terminal(detail)
                    });
                }
                Some(ServerMessage::Error { message }) => {
                    return Err(TransportError::ReceiveFailed(format!("remote error: {message}")));
                }
                Some(other) => {
                    // Pongs and replies to requests that already timed out.
                    tracing::debug!("skipping unrelated message: {:?}", other);
                }
                None => return Err(TransportError::ConnectionClosed),
            }
        }
    }
}

/// Remote store client over a message transport.
///
/// Requests are serialized over one connection; each waits for its own
/// reply before the next is sent.
pub struct WebSocketRemote<T: Transport = WebSocketTransport> {
    config: ClientConfig,
    link: tokio::sync::Mutex<Link<T>>,
}

impl WebSocketRemote<WebSocketTransport> {
    /// Creates a client using the WebSocket transport.
    pub fn new(config: ClientConfig) -> Self {
        let transport = WebSocketTransport::with_connect_timeout(config.request_timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> WebSocketRemote<T> {
    /// Creates a client with a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        WebSocketRemote {
            config,
            link: tokio::sync::Mutex::new(Link {
                transport,
                next_request_id: 0,
                state: ConnectionState::Disconnected,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.link.lock().await.state
    }

    /// Closes the connection. The next request reconnects.
    pub async fn disconnect(&self) {
        self.link.lock().await.drop_connection().await;
    }

    async fn send_request(
        &self,
        path: &str,
        kind: MutationKind,
        payload: Option<&Value>,
    ) -> ApplyOutcome {
        if let Err(e) = validate_path(path) {
            return ApplyOutcome::Terminal(e.to_string());
        }

        let mut link = self.link.lock().await;
        if !link.transport.is_connected() {
            if let Err(e) = link.connect_with_retry(&self.config).await {
                return ApplyOutcome::Retryable(format!("remote unreachable: {e}"));
            }
        }

        link.next_request_id += 1;
        let request_id = link.next_request_id;
        let msg = ClientMessage::request(request_id, path, kind, payload);

        if let Err(e) = link.transport.send(msg).await {
            link.drop_connection().await;
            return ApplyOutcome::Retryable(e.to_string());
        }

        let reply = tokio::time::timeout(self.config.request_timeout, link.await_reply(request_id)).await;
        match reply {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                link.drop_connection().await;
                ApplyOutcome::Retryable(e.to_string())
            }
            Err(_) => {
                // A late reply would be unmatched; start over on a fresh connection.
                link.drop_connection().await;
                ApplyOutcome::Retryable(format!(
                    "no reply within {}ms",
                    self.config.request_timeout.as_millis()
                ))
            }
        }
    }
}

impl<T: Transport> RemoteStore for WebSocketRemote<T> {
    fn apply<'a>(
        &'a self,
        path: &'a str,
        kind: MutationKind,
        payload: Option<&'a Value>,
    ) -> Pin<Box<dyn Future<Output = ApplyOutcome> + Send + 'a>> {
        Box::pin(self.send_request(path, kind, payload))
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;

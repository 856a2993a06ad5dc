// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use outbox_core::{ClientMessage, Mutation, MutationKind, MutationRecord, RecordId, RejectCode, ServerMessage};
use serde_json::{json, Value};

use super::connectivity::{ConnectivityState, SharedConnectivity};
use super::remote::{ApplyOutcome, RemoteStore};
use super::transport::{Transport, TransportError, TransportFuture};

/// Create an `apply` record stamped at the given wall clock time.
pub fn apply_record(wall_ms: u64, path: &str) -> MutationRecord {
    MutationRecord::new(
        RecordId::new(wall_ms, 0),
        Mutation::apply(path, json!({ "title": format!("at {wall_ms}") })),
    )
}

/// Create a `delete` record stamped at the given wall clock time.
pub fn delete_record(wall_ms: u64, path: &str) -> MutationRecord {
    MutationRecord::new(RecordId::new(wall_ms, 0), Mutation::delete(path))
}

/// Shared connectivity flag starting in the given state.
pub fn connectivity(state: ConnectivityState) -> Arc<SharedConnectivity> {
    Arc::new(SharedConnectivity::new(state))
}

/// One call observed by [`ScriptedRemote`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub path: String,
    pub kind: MutationKind,
    pub payload: Option<Value>,
}

/// Remote store fake with per-path scripted outcomes.
///
/// Paths without a script succeed. Scripts are consumed in order, one
/// outcome per call; the last outcome repeats once the script runs dry.
#[derive(Clone, Default)]
pub struct ScriptedRemote {
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    scripts: Arc<Mutex<HashMap<String, VecDeque<ApplyOutcome>>>>,
    latency: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    go_offline_after: Arc<Mutex<Option<(String, Arc<SharedConnectivity>)>>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Script the outcomes returned for `path`.
    pub fn script(&self, path: &str, outcomes: Vec<ApplyOutcome>) {
        self.scripts.lock().unwrap().insert(path.to_string(), outcomes.into());
    }

    /// Flip `connectivity` offline right after the call for `path` returns.
    pub fn go_offline_after(&self, path: &str, connectivity: Arc<SharedConnectivity>) {
        *self.go_offline_after.lock().unwrap() = Some((path.to_string(), connectivity));
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    /// Highest number of overlapping calls seen.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, path: &str) -> ApplyOutcome {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(path) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or(ApplyOutcome::Applied),
            Some(script) => script.front().cloned().unwrap_or(ApplyOutcome::Applied),
            None => ApplyOutcome::Applied,
        }
    }
}

impl RemoteStore for ScriptedRemote {
    fn apply<'a>(
        &'a self,
        path: &'a str,
        kind: MutationKind,
        payload: Option<&'a Value>,
    ) -> Pin<Box<dyn Future<Output = ApplyOutcome> + Send + 'a>> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(RemoteCall {
                path: path.to_string(),
                kind,
                payload: payload.cloned(),
            });

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            let outcome = self.next_outcome(path);
            if let Some((trigger, connectivity)) = self.go_offline_after.lock().unwrap().as_ref() {
                if trigger == path {
                    connectivity.set(ConnectivityState::Offline);
                }
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        })
    }
}

/// How [`MockTransport`] answers the next request it is sent.
#[derive(Debug, Clone)]
pub enum Reply {
    Ack,
    Reject(RejectCode, &'static str),
    /// Never answer.
    Silence,
    /// Close the connection instead of answering.
    Close,
    /// Fail the send itself.
    SendFail,
    /// Send a pong and a stale ack before the real ack.
    NoisyAck,
    /// Send a connection-level error.
    ServerError(&'static str),
}

#[derive(Default)]
struct MockState {
    connected: AtomicBool,
    connects: AtomicUsize,
    connect_failures: AtomicU32,
    sent: Mutex<Vec<ClientMessage>>,
    replies: Mutex<VecDeque<Reply>>,
    /// `None` marks a closed connection.
    incoming: Mutex<VecDeque<Option<ServerMessage>>>,
}

/// Transport fake that answers requests from a script.
///
/// Requests beyond the script are acked. Clones share state, so a test can
/// keep one clone to inspect traffic after handing another to the client.
/// With nothing to deliver, `recv` pends forever.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies to use for the next requests, in order.
    pub fn script(&self, replies: Vec<Reply>) {
        self.state.replies.lock().unwrap().extend(replies);
    }

    /// Makes the next `n` connect attempts fail.
    pub fn fail_connects(&self, n: u32) {
        self.state.connect_failures.store(n, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.state.sent.lock().unwrap().clone()
    }

    /// Successful connects so far.
    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    fn push(&self, msg: Option<ServerMessage>) {
        self.state.incoming.lock().unwrap().push_back(msg);
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let failures = self.state.connect_failures.load(Ordering::SeqCst);
            if failures > 0 {
                self.state.connect_failures.store(failures - 1, Ordering::SeqCst);
                return Err(TransportError::ConnectionFailed("mock failure".into()));
            }
            self.state.incoming.lock().unwrap().clear();
            self.state.connected.store(true, Ordering::SeqCst);
            self.state.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.state.connected.store(false, Ordering::SeqCst);
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(TransportError::ConnectionClosed);
            }
            let reply = self.state.replies.lock().unwrap().pop_front().unwrap_or(Reply::Ack);
            if let Reply::SendFail = reply {
                self.state.connected.store(false, Ordering::SeqCst);
                return Err(TransportError::SendFailed("mock send failure".into()));
            }

            let request_id = msg.request_id();
            self.state.sent.lock().unwrap().push(msg);
            let Some(id) = request_id else {
                return Ok(());
            };

            match reply {
                Reply::Ack => self.push(Some(ServerMessage::ack(id))),
                Reply::Reject(code, message) => {
                    self.push(Some(ServerMessage::rejected(id, code, message)))
                }
                Reply::Silence | Reply::SendFail => {}
                Reply::Close => self.push(None),
                Reply::NoisyAck => {
                    self.push(Some(ServerMessage::pong(0)));
                    self.push(Some(ServerMessage::ack(id.wrapping_add(1000))));
                    self.push(Some(ServerMessage::ack(id)));
                }
                Reply::ServerError(message) => self.push(Some(ServerMessage::error(message))),
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(TransportError::ConnectionClosed);
            }
            let next = self.state.incoming.lock().unwrap().pop_front();
            match next {
                Some(Some(msg)) => Ok(Some(msg)),
                Some(None) => {
                    self.state.connected.store(false, Ordering::SeqCst);
                    Ok(None)
                }
                None => std::future::pending().await,
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }
}

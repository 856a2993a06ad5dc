// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability tracking.
//!
//! [`SharedConnectivity`] is the process-wide online/offline flag, readable
//! lock-free from the drain loop. [`ConnectivityMonitor`] owns transitions of
//! that flag: it takes explicit signals via [`ConnectivityMonitor::report`]
//! and, optionally, runs a periodic [`ReachabilityProbe`] in the background.
//! Listeners are told about each actual change exactly once.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// State values for the atomic state field.
const STATE_OFFLINE: u8 = 0;
const STATE_ONLINE: u8 = 1;

/// Buffered transitions per listener.
const LISTENER_CAPACITY: usize = 16;

/// Whether the remote store is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    fn to_u8(self) -> u8 {
        match self {
            ConnectivityState::Online => STATE_ONLINE,
            ConnectivityState::Offline => STATE_OFFLINE,
        }
    }

    fn from_u8(value: u8) -> Self {
        if value == STATE_ONLINE {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityState::Online => f.write_str("online"),
            ConnectivityState::Offline => f.write_str("offline"),
        }
    }
}

/// Connectivity flag shared between the monitor and the sync engine.
pub struct SharedConnectivity {
    state: AtomicU8,
    transitions: AtomicU64,
}

impl SharedConnectivity {
    pub fn new(initial: ConnectivityState) -> Self {
        SharedConnectivity { state: AtomicU8::new(initial.to_u8()), transitions: AtomicU64::new(0) }
    }

    pub fn get(&self) -> ConnectivityState {
        ConnectivityState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_online(&self) -> bool {
        self.get() == ConnectivityState::Online
    }

    /// Sets the state. Returns true if it actually changed.
    pub fn set(&self, state: ConnectivityState) -> bool {
        let previous = self.state.swap(state.to_u8(), Ordering::AcqRel);
        let changed = previous != state.to_u8();
        if changed {
            self.transitions.fetch_add(1, Ordering::AcqRel);
        }
        changed
    }

    /// Number of state changes since creation.
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Acquire)
    }
}

/// A source of reachability samples.
pub trait ReachabilityProbe: Send + Sync {
    /// Checks whether the remote is currently reachable.
    fn check(&self) -> Pin<Box<dyn Future<Output = ConnectivityState> + Send + '_>>;
}

/// Probes reachability by opening a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    /// `host:port` to connect to.
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        TcpProbe { addr: addr.into(), timeout }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl ReachabilityProbe for TcpProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = ConnectivityState> + Send + '_>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&self.addr)).await
            {
                Ok(Ok(_)) => ConnectivityState::Online,
                Ok(Err(e)) => {
                    tracing::debug!("probe {} failed: {}", self.addr, e);
                    ConnectivityState::Offline
                }
                Err(_) => {
                    tracing::debug!("probe {} timed out", self.addr);
                    ConnectivityState::Offline
                }
            }
        })
    }
}

/// Derives the `host:port` a probe should dial from a remote URL.
///
/// Falls back to the scheme's default port (80 for `ws`, 443 for `wss`).
pub fn probe_addr_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port_or_known_default().or(match parsed.scheme() {
        "ws" => Some(80),
        "wss" => Some(443),
        _ => None,
    })?;
    // IPv6 hosts come back bracketed already.
    Some(format!("{host}:{port}"))
}

/// Tracks connectivity and notifies listeners on transitions.
pub struct ConnectivityMonitor {
    shared: Arc<SharedConnectivity>,
    listeners: Mutex<Vec<mpsc::Sender<ConnectivityState>>>,
    cancel_token: CancellationToken,
}

impl ConnectivityMonitor {
    /// Creates a monitor starting in `initial`.
    pub fn new(initial: ConnectivityState) -> Self {
        ConnectivityMonitor {
            shared: Arc::new(SharedConnectivity::new(initial)),
            listeners: Mutex::new(Vec::new()),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Creates a monitor whose initial state is sampled from `probe`.
    pub async fn sample<P: ReachabilityProbe + ?Sized>(probe: &P) -> Self {
        let initial = probe.check().await;
        tracing::info!("initial connectivity: {}", initial);
        Self::new(initial)
    }

    /// The shared flag, for the sync engine to observe.
    pub fn shared(&self) -> Arc<SharedConnectivity> {
        Arc::clone(&self.shared)
    }

    pub fn state(&self) -> ConnectivityState {
        self.shared.get()
    }

    /// Registers a listener for transitions.
    pub fn subscribe(&self) -> mpsc::Receiver<ConnectivityState> {
        let (tx, rx) = mpsc::channel(LISTENER_CAPACITY);
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).push(tx);
        rx
    }

    /// Feeds an observed state (probe result or host signal).
    ///
    /// Listeners are notified only if the state changed. Returns whether it
    /// did.
    pub fn report(&self, state: ConnectivityState) -> bool {
        if !self.shared.set(state) {
            return false;
        }

        tracing::info!("connectivity changed: {}", state);
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|tx| match tx.try_send(state) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("connectivity listener full, dropped {} transition", state);
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        true
    }

    /// Starts polling `probe` every `interval` in the background.
    ///
    /// Runs until [`ConnectivityMonitor::cancel`] is called.
    pub fn spawn_probe<P>(self: &Arc<Self>, probe: P, interval: Duration) -> JoinHandle<()>
    where
        P: ReachabilityProbe + 'static,
    {
        let monitor = Arc::clone(self);
        let cancel_token = self.cancel_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }

                let state = tokio::select! {
                    _ = cancel_token.cancelled() => return,
                    state = probe.check() => state,
                };
                monitor.report(state);
            }
        })
    }

    /// Stops background probing.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;

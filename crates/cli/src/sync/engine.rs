// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Drains the mutation queue into the remote store.
//!
//! A drain cycle works from a snapshot of the queue taken when it starts.
//! Each record is sent once per cycle and resolved by the remote's
//! classification: applied records are removed, terminal failures are
//! dropped, retryable failures go to the back of the queue. Anything
//! enqueued mid-cycle waits for the next one.
//!
//! At most one cycle runs at a time. A drain requested while another is in
//! progress returns immediately and the running cycle starts another pass
//! when it finishes, so the request is never lost.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use outbox_core::{Mutation, MutationKind, MutationRecord, RecordId};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::backoff::Backoff;
use super::connectivity::{ConnectivityMonitor, ConnectivityState, SharedConnectivity};
use super::events::{ListenerRegistry, SyncEvent};
use super::queue::MutationQueue;
use super::remote::{ApplyOutcome, RemoteStore};
use super::store::{QueueStore, StoreError};

/// Tuning for the sync engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Failed attempts after which a record is abandoned.
    pub max_attempts: u32,
    /// Delay before the first follow-up cycle.
    pub backoff_initial: Duration,
    /// Cap on the delay between follow-up cycles.
    pub backoff_max: Duration,
    pub max_listeners: usize,
    /// Events buffered per listener.
    pub listener_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_attempts: 5,
            backoff_initial: Duration::from_millis(500),
            backoff_max: Duration::from_secs(60),
            max_listeners: 32,
            listener_capacity: 64,
        }
    }
}

/// Error type for sync engine operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The listener registry is full.
    #[error("too many listeners (max {max})")]
    TooManyListeners { max: usize },

    /// The mutation is malformed.
    #[error(transparent)]
    Mutation(#[from] outbox_core::Error),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// What one drain cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// The cycle did not run: offline, or another drain was in progress.
    pub skipped: bool,
    pub applied: usize,
    /// Sent back to the tail after a retryable failure.
    pub requeued: usize,
    /// Dropped after a terminal failure.
    pub dropped: usize,
    /// Dropped after reaching the attempt ceiling.
    pub abandoned: usize,
    /// Not sent because an earlier record on the same path failed this cycle.
    pub deferred: usize,
    /// Connectivity was lost before the snapshot was exhausted.
    pub aborted: bool,
    /// Delay until the scheduled follow-up cycle, if one was scheduled.
    pub retry_in: Option<Duration>,
}

impl DrainReport {
    fn skipped() -> Self {
        DrainReport { skipped: true, ..Self::default() }
    }

    /// Records resolved (applied or dropped) by this cycle.
    pub fn resolved(&self) -> usize {
        self.applied + self.dropped + self.abandoned
    }
}

/// Clears the drain-in-progress flag when the cycle ends.
struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

struct Inner<R, S: QueueStore> {
    config: EngineConfig,
    queue: Mutex<MutationQueue<S>>,
    remote: R,
    connectivity: Arc<SharedConnectivity>,
    listeners: ListenerRegistry,
    /// Set while a cycle runs.
    draining: AtomicBool,
    /// A drain was requested while one was running.
    rerun: AtomicBool,
    /// A follow-up cycle is waiting on its backoff delay.
    retry_scheduled: AtomicBool,
    /// Paths requeued by the last failed cycle, held until the follow-up.
    cooling: Mutex<HashSet<String>>,
    backoff: Mutex<Backoff>,
    cancel_token: CancellationToken,
}

impl<R, S: QueueStore> Inner<R, S> {
    // Never held across an await.
    fn queue(&self) -> MutexGuard<'_, MutationQueue<S>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn backoff(&self) -> MutexGuard<'_, Backoff> {
        self.backoff.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cooling(&self) -> MutexGuard<'_, HashSet<String>> {
        self.cooling.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claims the drain flag, or leaves a rerun request for the holder.
    fn try_begin(&self) -> Option<DrainGuard<'_>> {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Some(DrainGuard { flag: &self.draining });
            }
            self.rerun.store(true, Ordering::SeqCst);
            // The holder checks `rerun` only after releasing the flag. If it
            // is still held, the request is seen; otherwise claim it here.
            if self.draining.load(Ordering::SeqCst) {
                return None;
            }
        }
    }
}

/// Offline-tolerant mutation sync.
///
/// Cheap to clone; clones share the same queue and drain state.
pub struct SyncEngine<R, S: QueueStore> {
    inner: Arc<Inner<R, S>>,
}

impl<R, S: QueueStore> Clone for SyncEngine<R, S> {
    fn clone(&self) -> Self {
        SyncEngine { inner: Arc::clone(&self.inner) }
    }
}

impl<R, S> SyncEngine<R, S>
where
    R: RemoteStore + 'static,
    S: QueueStore + 'static,
{
    /// Creates an engine over a hydrated queue.
    ///
    /// `connectivity` should be the flag the connectivity monitor drives.
    pub fn new(
        config: EngineConfig,
        queue: MutationQueue<S>,
        remote: R,
        connectivity: Arc<SharedConnectivity>,
    ) -> Self {
        let listeners = ListenerRegistry::new(config.max_listeners, config.listener_capacity);
        let backoff = Backoff::new(config.backoff_initial, config.backoff_max);
        SyncEngine {
            inner: Arc::new(Inner {
                config,
                queue: Mutex::new(queue),
                remote,
                connectivity,
                listeners,
                draining: AtomicBool::new(false),
                rerun: AtomicBool::new(false),
                retry_scheduled: AtomicBool::new(false),
                cooling: Mutex::new(HashSet::new()),
                backoff: Mutex::new(backoff),
                cancel_token: CancellationToken::new(),
            }),
        }
    }

    /// Queues a mutation durably and, if online, starts a drain.
    pub fn submit(&self, mutation: Mutation) -> RecordId {
        let record = self.inner.queue().enqueue(mutation);
        if self.inner.connectivity.is_online() {
            self.trigger();
        }
        record.id
    }

    /// Queues a mutation built from its parts.
    ///
    /// Fails only for an `apply` without a payload. Malformed paths are
    /// accepted here and reported as terminal failures when drained.
    pub fn submit_mutation(
        &self,
        path: impl Into<String>,
        kind: MutationKind,
        payload: Option<Value>,
    ) -> SyncResult<RecordId> {
        let mutation = Mutation::new(path, kind, payload)?;
        Ok(self.submit(mutation))
    }

    /// Registers a listener for record resolutions.
    pub fn subscribe(&self) -> SyncResult<mpsc::Receiver<SyncEvent>> {
        self.inner
            .listeners
            .subscribe()
            .ok_or(SyncError::TooManyListeners { max: self.inner.config.max_listeners })
    }

    /// Snapshot of queued records in delivery order.
    pub fn pending(&self) -> Vec<MutationRecord> {
        self.inner.queue().peek_all()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.queue().len()
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::SeqCst)
    }

    pub fn connectivity(&self) -> Arc<SharedConnectivity> {
        Arc::clone(&self.inner.connectivity)
    }

    /// Saves the queue if an earlier save failed.
    pub fn flush(&self) -> SyncResult<()> {
        self.inner.queue().flush()?;
        Ok(())
    }

    /// Starts a drain in the background without waiting for it.
    ///
    /// Paths waiting on a scheduled follow-up are left for that follow-up.
    /// Outside a Tokio runtime this does nothing; the records stay queued.
    pub fn trigger(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime, drain deferred");
            return;
        };
        let engine = self.clone();
        handle.spawn(async move {
            engine.run_cycle(true).await;
        });
    }

    /// Runs one drain cycle over every queued record.
    pub async fn drain(&self) -> DrainReport {
        self.run_cycle(false).await
    }

    async fn run_cycle(&self, hold_cooling: bool) -> DrainReport {
        let inner = &self.inner;
        if !inner.connectivity.is_online() {
            tracing::debug!("offline, drain skipped");
            return DrainReport::skipped();
        }
        let Some(guard) = inner.try_begin() else {
            tracing::debug!("drain already in progress");
            return DrainReport::skipped();
        };

        inner.rerun.store(false, Ordering::SeqCst);
        let snapshot = inner.queue().peek_all();
        let mut report = DrainReport::default();
        // Paths with a record sent back; later records on them wait.
        let cooling = if hold_cooling { inner.cooling().clone() } else { HashSet::new() };
        let mut blocked = cooling.clone();

        for record in &snapshot {
            if !inner.connectivity.is_online() {
                report.aborted = true;
                break;
            }
            if blocked.contains(record.path()) {
                report.deferred += 1;
                continue;
            }
            if !inner.queue().contains(record.id) {
                continue;
            }

            tracing::debug!("sending {} {} {}", record.id, record.kind(), record.path());
            let outcome = inner.remote.apply(record.path(), record.kind(), record.payload()).await;
            self.resolve(record, outcome, &mut report, &mut blocked);
        }

        let remaining = {
            let mut queue = inner.queue();
            if let Err(e) = queue.flush() {
                tracing::warn!("queue still not persisted after drain: {}", e);
            }
            queue.len()
        };
        drop(guard);

        if report.aborted {
            tracing::info!("connectivity lost mid-drain, {} records stay queued", remaining);
        } else if report.requeued > 0 {
            *inner.cooling() = blocked;
            let delay = inner.backoff().next_delay();
            report.retry_in = Some(delay);
            self.schedule_retry(delay);
        } else if cooling.is_empty() {
            inner.cooling().clear();
            inner.backoff().reset();
        }

        if !snapshot.is_empty() {
            tracing::info!(
                "drain finished: {} applied, {} requeued, {} dropped, {} abandoned, {} remaining",
                report.applied,
                report.requeued,
                report.dropped,
                report.abandoned,
                remaining
            );
        }

        if inner.rerun.swap(false, Ordering::SeqCst) {
            self.trigger();
        }
        report
    }

    fn resolve(
        &self,
        record: &MutationRecord,
        outcome: ApplyOutcome,
        report: &mut DrainReport,
        blocked: &mut HashSet<String>,
    ) {
        let inner = &self.inner;
        match outcome {
            ApplyOutcome::Applied => {
                inner.queue().remove(record.id);
                report.applied += 1;
                inner.listeners.publish(&SyncEvent::success(record.id, record.path()));
            }
            ApplyOutcome::Terminal(detail) => {
                tracing::warn!("dropping {} at {}: {}", record.id, record.path(), detail);
                inner.queue().remove(record.id);
                report.dropped += 1;
                inner.listeners.publish(&SyncEvent::terminal_failure(record.id, record.path(), detail));
            }
            ApplyOutcome::Retryable(detail) => {
                let attempts = record.attempts.saturating_add(1);
                if attempts >= inner.config.max_attempts {
                    tracing::warn!(
                        "abandoning {} at {} after {} attempts: {}",
                        record.id,
                        record.path(),
                        attempts,
                        detail
                    );
                    inner.queue().remove(record.id);
                    report.abandoned += 1;
                    let detail = format!("abandoned after {attempts} attempts: {detail}");
                    inner.listeners.publish(&SyncEvent::terminal_failure(record.id, record.path(), detail));
                } else {
                    tracing::warn!(
                        "requeueing {} at {} (attempt {}): {}",
                        record.id,
                        record.path(),
                        attempts,
                        detail
                    );
                    inner.queue().requeue_to_tail(record.id);
                    report.requeued += 1;
                    blocked.insert(record.path().to_string());
                }
            }
        }
    }

    /// Schedules a follow-up cycle after `delay`. At most one is pending.
    fn schedule_retry(&self, delay: Duration) {
        if self.inner.retry_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.inner.retry_scheduled.store(false, Ordering::SeqCst);
            return;
        };

        tracing::debug!("follow-up drain in {:?}", delay);
        let engine = self.clone();
        let cancel_token = self.inner.cancel_token.clone();
        handle.spawn(async move {
            tokio::select! {
                _ = cancel_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    engine.inner.retry_scheduled.store(false, Ordering::SeqCst);
                    engine.inner.cooling().clear();
                    engine.drain().await;
                }
            }
        });
    }

    /// Drains whenever `monitor` reports the remote reachable again.
    ///
    /// Runs until [`SyncEngine::shutdown`] or the monitor goes away.
    pub fn follow(&self, monitor: &ConnectivityMonitor) -> JoinHandle<()> {
        let mut transitions = monitor.subscribe();
        let engine = self.clone();
        let cancel_token = self.inner.cancel_token.clone();

        tokio::spawn(async move {
            loop {
                let state = tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    state = transitions.recv() => state,
                };
                match state {
                    Some(ConnectivityState::Online) => {
                        tracing::info!("online, draining {} pending", engine.pending_count());
                        engine.inner.cooling().clear();
                        engine.trigger();
                    }
                    Some(ConnectivityState::Offline) => {
                        tracing::info!("offline, {} pending", engine.pending_count());
                    }
                    None => break,
                }
            }
        })
    }

    /// Stops follow-up cycles and connectivity following.
    ///
    /// A cycle already running finishes its current record and the rest of
    /// its snapshot.
    pub fn shutdown(&self) {
        self.inner.cancel_token.cancel();
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory mutation queue mirrored to a durable store.
//!
//! Insertion order is delivery order. Every change (append, removal,
//! requeue) is saved before the call returns. A failed save does not undo the
//! in-memory change: the queue is marked dirty and the next save, which always
//! writes the whole queue, catches the store up.

use std::collections::HashSet;

use outbox_core::{IdGenerator, Mutation, MutationRecord, RecordId};

use super::store::{QueueStore, StoreResult};

/// Ordered queue of pending mutations.
pub struct MutationQueue<S: QueueStore> {
    records: Vec<MutationRecord>,
    store: S,
    ids: IdGenerator,
    /// Set while the store is behind the in-memory queue.
    dirty: bool,
    /// Saves that have failed since the queue was opened.
    persist_failures: u64,
}

impl<S: QueueStore> MutationQueue<S> {
    /// Opens the queue, hydrating it from `store`.
    ///
    /// Records repeating an earlier id are dropped so ids stay unique.
    pub fn hydrate(store: S) -> Self {
        let ids = IdGenerator::new();
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for record in store.load() {
            if !seen.insert(record.id) {
                tracing::warn!("dropping duplicate queued record {}", record.id);
                continue;
            }
            ids.observe(&record.id);
            records.push(record);
        }

        if !records.is_empty() {
            tracing::info!("hydrated {} pending mutations", records.len());
        }

        MutationQueue { records, store, ids, dirty: false, persist_failures: 0 }
    }

    /// Appends a mutation to the tail, assigning its id and enqueue time.
    pub fn enqueue(&mut self, mutation: Mutation) -> MutationRecord {
        let record = MutationRecord::new(self.ids.next_id(), mutation);
        tracing::debug!("enqueued {} {} {}", record.id, record.kind(), record.path());
        self.records.push(record.clone());
        self.persist();
        record
    }

    /// Snapshot of the queue in delivery order.
    pub fn peek_all(&self) -> Vec<MutationRecord> {
        self.records.clone()
    }

    /// Looks up a queued record.
    pub fn get(&self, id: RecordId) -> Option<&MutationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Removes a record. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: RecordId) -> Option<MutationRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let record = self.records.remove(index);
        self.persist();
        Some(record)
    }

    /// Moves a record to the tail after a retryable failure.
    ///
    /// Later records on the same path move with it, in their existing order,
    /// so a path is never delivered out of enqueue order. Returns the record's
    /// new failure count, or `None` if it is no longer queued.
    pub fn requeue_to_tail(&mut self, id: RecordId) -> Option<u32> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let path = self.records[index].path().to_string();

        let mut moved = Vec::new();
        let mut kept = Vec::with_capacity(self.records.len());
        for (i, record) in self.records.drain(..).enumerate() {
            if i >= index && record.path() == path {
                moved.push(record);
            } else {
                kept.push(record);
            }
        }

        let attempts = match moved.first_mut() {
            Some(first) => {
                first.attempts = first.attempts.saturating_add(1);
                first.attempts
            }
            None => {
                self.records = kept;
                return None;
            }
        };
        kept.extend(moved);
        self.records = kept;
        self.persist();
        Some(attempts)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if the last save failed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// Retries persistence if a previous save failed.
    pub fn flush(&mut self) -> StoreResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.save()
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            tracing::warn!("failed to persist queue ({} records held in memory): {}", self.len(), e);
        }
    }

    fn save(&mut self) -> StoreResult<()> {
        match self.store.save(&self.records) {
            Ok(()) => {
                if self.dirty {
                    tracing::info!("queue persisted again after earlier failure");
                }
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                self.persist_failures += 1;
                Err(e)
            }
        }
    }
}

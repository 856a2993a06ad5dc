// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for the pending mutation queue.
//!
//! The whole queue lives under one well-known key (`pending_mutations`) as a
//! JSONL file, rewritten atomically on every save. A file that cannot be read
//! back is treated as an empty queue; it is moved aside for inspection rather
//! than failing startup.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fs2::FileExt;
use outbox_core::{jsonl, MutationRecord};

/// Storage key the queue is persisted under.
pub const QUEUE_KEY: &str = "pending_mutations";

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or writing the queue failed.
    #[error("failed to write queue: {0}")]
    Write(#[from] outbox_core::Error),

    /// Another process is driving this queue.
    #[error("queue at {0} is locked by another process (is `outbox watch` running?)")]
    Locked(PathBuf),

    /// The store refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persists the ordered list of pending mutations.
pub trait QueueStore: Send + Sync {
    /// Returns the last saved queue, or an empty one if nothing readable exists.
    fn load(&self) -> Vec<MutationRecord>;

    /// Replaces the saved queue. Readers never observe a partial write.
    fn save(&self, records: &[MutationRecord]) -> StoreResult<()>;
}

impl<S: QueueStore + ?Sized> QueueStore for Arc<S> {
    fn load(&self) -> Vec<MutationRecord> {
        (**self).load()
    }

    fn save(&self, records: &[MutationRecord]) -> StoreResult<()> {
        (**self).save(records)
    }
}

/// Path of the queue file in `dir`.
pub fn queue_path(dir: &Path) -> PathBuf {
    dir.join(format!("{QUEUE_KEY}.jsonl"))
}

/// File-backed queue store in a state directory.
///
/// Holds an exclusive lock on `pending_mutations.lock` for its lifetime so
/// exactly one process drives the queue.
pub struct FileQueueStore {
    /// Path to the queue file.
    path: PathBuf,
    /// Held for the lock, released on drop.
    _lock: File,
}

impl FileQueueStore {
    /// Opens (creating if needed) the queue store in `dir`.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;

        let lock_path = dir.join(format!("{QUEUE_KEY}.lock"));
        let lock = OpenOptions::new().create(true).write(true).truncate(false).open(&lock_path)?;
        lock.try_lock_exclusive().map_err(|_| StoreError::Locked(dir.to_path_buf()))?;

        Ok(FileQueueStore { path: queue_path(dir), _lock: lock })
    }

    /// Reads the queue in `dir` without taking the lock.
    ///
    /// Saves replace the file atomically, so this never sees a partial write
    /// even while another process drives the queue.
    pub fn peek(dir: &Path) -> StoreResult<Vec<MutationRecord>> {
        Ok(jsonl::read_all(&queue_path(dir))?)
    }

    /// Path of the queue file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves an unreadable queue file out of the way.
    fn quarantine(&self) {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        let target = PathBuf::from(name);
        match fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!("moved unreadable queue to {}", target.display()),
            Err(e) => tracing::warn!("failed to move unreadable queue aside: {}", e),
        }
    }
}

impl QueueStore for FileQueueStore {
    fn load(&self) -> Vec<MutationRecord> {
        match jsonl::read_all(&self.path) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("queue file {} unreadable, starting empty: {}", self.path.display(), e);
                self.quarantine();
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[MutationRecord]) -> StoreResult<()> {
        jsonl::write_atomic(&self.path, records)?;
        Ok(())
    }
}

/// In-memory queue store.
///
/// Useful for embedding without a disk and for exercising persistence
/// failures: saves can be made to fail on demand.
#[derive(Default)]
pub struct MemoryQueueStore {
    records: Mutex<Vec<MutationRecord>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `records`.
    pub fn with_records(records: Vec<MutationRecord>) -> Self {
        MemoryQueueStore { records: Mutex::new(records), ..Self::default() }
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the last successfully saved queue.
    pub fn saved(&self) -> Vec<MutationRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl QueueStore for MemoryQueueStore {
    fn load(&self) -> Vec<MutationRecord> {
        self.saved()
    }

    fn save(&self, records: &[MutationRecord]) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".to_string()));
        }
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

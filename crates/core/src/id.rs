// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record identifiers and the clock that stamps them.
//!
//! A [`RecordId`] pairs a wall-clock millisecond with a logical counter so
//! that ids stay unique and strictly increasing even when several mutations
//! are enqueued within the same millisecond or the wall clock steps back.
//!
//! Format: `{wall_ms}-{counter}`

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Process-local unique identifier for a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Wall clock time in milliseconds since Unix epoch.
    pub wall_ms: u64,
    /// Logical counter for ids minted in the same millisecond.
    pub counter: u32,
}

impl RecordId {
    /// Creates a new id with the given components.
    pub fn new(wall_ms: u64, counter: u32) -> Self {
        RecordId { wall_ms, counter }
    }

    /// Parses an id from its string representation.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_ms.cmp(&other.wall_ms).then_with(|| self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wall_ms, self.counter)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (wall, counter) = s.split_once('-').ok_or_else(|| {
            Error::InvalidRecordId(format!("expected format 'wall_ms-counter', got '{s}'"))
        })?;

        let wall_ms = wall
            .parse::<u64>()
            .map_err(|_| Error::InvalidRecordId(format!("invalid wall_ms '{wall}' in '{s}'")))?;

        let counter = counter
            .parse::<u32>()
            .map_err(|_| Error::InvalidRecordId(format!("invalid counter '{counter}' in '{s}'")))?;

        Ok(RecordId::new(wall_ms, counter))
    }
}

/// Trait for getting the current wall clock time.
///
/// This allows injecting a fixed clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// Mints strictly increasing [`RecordId`]s.
///
/// Thread-safe. Ids previously persisted can be fed back through
/// [`IdGenerator::observe`] so a restarted process never reissues them.
pub struct IdGenerator<C: ClockSource = SystemClock> {
    clock: C,
    last: Mutex<RecordId>,
}

impl IdGenerator<SystemClock> {
    /// Creates a generator backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for IdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> IdGenerator<C> {
    /// Creates a generator with a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        IdGenerator { clock, last: Mutex::new(RecordId::new(0, 0)) }
    }

    /// Mints the next id.
    ///
    /// If the wall clock has not advanced past the last id (or went
    /// backwards), the counter is bumped instead.
    pub fn next_id(&self) -> RecordId {
        let physical = self.clock.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let id = if physical > last.wall_ms {
            RecordId::new(physical, 0)
        } else {
            RecordId::new(last.wall_ms, last.counter.saturating_add(1))
        };
        *last = id;
        id
    }

    /// Records an id minted elsewhere (e.g. hydrated from disk).
    pub fn observe(&self, id: &RecordId) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if *id > *last {
            *last = *id;
        }
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

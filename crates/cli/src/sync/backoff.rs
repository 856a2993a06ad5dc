// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff between follow-up drain cycles.

use std::time::Duration;

/// Doubling delay, capped at a maximum.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Backoff { initial, max: max.max(initial), current: None }
    }

    /// Returns the next delay: `initial` first, then doubling up to `max`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => self.initial,
            Some(previous) => previous.saturating_mul(2).min(self.max),
        };
        self.current = Some(delay);
        delay
    }

    /// Starts over from `initial`.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;

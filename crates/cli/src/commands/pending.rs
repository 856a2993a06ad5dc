// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `outbox pending`: list queued mutations.
//!
//! Reads the queue file without taking its lock, so it works while `watch`
//! is running.

use chrono::{DateTime, SecondsFormat};
use outbox_core::MutationRecord;

use super::Context;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::FileQueueStore;

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let records = FileQueueStore::peek(&ctx.state_dir)?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No pending mutations.");
            }
            for record in &records {
                println!("{}", format_record(record));
            }
        }
    }
    Ok(())
}

pub(crate) fn format_record(record: &MutationRecord) -> String {
    let when = i64::try_from(record.enqueued_at)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!("{}  {:<6}  {}  {}", record.id, record.kind().as_str(), record.path(), when);
    if record.attempts > 0 {
        line.push_str(&format!("  (failed {}x)", record.attempts));
    }
    line
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;

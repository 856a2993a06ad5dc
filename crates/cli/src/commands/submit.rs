// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `outbox submit`: queue a mutation durably.
//!
//! Nothing is sent here; `sync` or a running `watch` delivers it.

use outbox_core::{validate_path, Mutation};
use serde_json::Value;

use super::Context;
use crate::cli::OutputFormat;
use crate::error::{Error, Result};

pub fn run(
    ctx: &Context,
    path: &str,
    json: Option<&str>,
    delete: bool,
    output: OutputFormat,
) -> Result<()> {
    let mutation = build_mutation(path, json, delete)?;
    let mut queue = ctx.open_queue()?;
    let record = queue.enqueue(mutation);
    // Fail loudly if the record did not reach disk.
    queue.flush()?;

    match output {
        OutputFormat::Text => println!("{}", record.id),
        OutputFormat::Json => println!("{}", serde_json::to_string(&record)?),
    }
    Ok(())
}

/// Builds a mutation from command-line arguments.
pub(crate) fn build_mutation(path: &str, json: Option<&str>, delete: bool) -> Result<Mutation> {
    validate_path(path)?;
    if delete {
        return Ok(Mutation::delete(path));
    }

    let raw = json.ok_or_else(|| Error::InvalidPayload("--json is required".to_string()))?;
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    Ok(Mutation::apply(path, value))
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;

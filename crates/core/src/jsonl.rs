// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) file utilities.
//!
//! Each record is stored as a single JSON line. Whole-file rewrites go
//! through a sibling temp file and a rename so readers only ever see the old
//! or the new contents.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Reads all records from a JSONL file.
///
/// Skips empty lines and returns an empty vec if the file doesn't exist.
/// Any malformed line fails the whole read.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(&line)?;
        records.push(record);
    }

    Ok(records)
}

/// Atomically replaces a JSONL file with the given records.
///
/// The records are written and fsynced to `<path>.tmp`, then renamed over
/// `path`.
pub fn write_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let temp_path = temp_path_for(path);

    {
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{json}")?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;

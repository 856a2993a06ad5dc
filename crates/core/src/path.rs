// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote store path validation.
//!
//! Paths are slash-delimited keys into the remote tree (`items/42/title`).
//! The remote rejects malformed paths outright, so they can be classified as
//! terminal failures before any network round-trip.

use crate::error::{Error, Result};

/// Maximum encoded length of a path in bytes.
pub const MAX_PATH_BYTES: usize = 768;

/// Characters the remote store refuses inside a path segment.
const FORBIDDEN_CHARS: &[char] = &['.', '#', '$', '[', ']'];

/// Validates a remote path.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] describing the first problem found.
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = |reason| Err(Error::InvalidPath { path: path.to_string(), reason });

    if path.is_empty() {
        return invalid("path is empty");
    }
    if path.len() > MAX_PATH_BYTES {
        return invalid("path exceeds 768 bytes");
    }
    if path.starts_with('/') || path.ends_with('/') {
        return invalid("leading or trailing slash");
    }
    if path.split('/').any(str::is_empty) {
        return invalid("empty segment");
    }
    if path.contains(FORBIDDEN_CHARS) {
        return invalid("contains one of . # $ [ ]");
    }
    if path.chars().any(char::is_control) {
        return invalid("contains control characters");
    }
    Ok(())
}

/// Returns true if the path is acceptable to the remote store.
pub fn is_valid_path(path: &str) -> bool {
    validate_path(path).is_ok()
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;

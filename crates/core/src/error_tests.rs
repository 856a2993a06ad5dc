// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    invalid_path = { Error::InvalidPath { path: "a//b".into(), reason: "empty segment" }, "a//b" },
    invalid_record_id = { Error::InvalidRecordId("nope".into()), "nope" },
    missing_payload = { Error::MissingPayload("items/1".into()), "requires a payload" },
    invalid_kind = { Error::InvalidKind("merge".into()), "apply, delete" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<()>("invalid").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
}

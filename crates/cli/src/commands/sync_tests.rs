// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn test_summary_counts_drops_and_abandons_as_failed() {
    let report = DrainReport { applied: 2, dropped: 1, abandoned: 1, ..DrainReport::default() };
    assert_eq!(summarize(&report, 0), "Applied 2, failed 2, requeued 0.");
}

#[test]
fn test_summary_mentions_leftovers() {
    let report = DrainReport { requeued: 1, ..DrainReport::default() };
    assert_eq!(summarize(&report, 3), "Applied 0, failed 0, requeued 1. 3 still pending.");
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the remote store client.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::sync::test_helpers::{MockTransport, Reply};
use outbox_core::RejectCode;
use serde_json::json;
use yare::parameterized;

fn test_config() -> ClientConfig {
    ClientConfig {
        url: "ws://mock".to_string(),
        request_timeout: Duration::from_secs(5),
        max_retries: 3,
        initial_delay_ms: 10,
        max_delay_secs: 1,
    }
}

fn remote(transport: &MockTransport) -> WebSocketRemote<MockTransport> {
    WebSocketRemote::with_transport(test_config(), transport.clone())
}

#[tokio::test]
async fn ack_is_applied() {
    let transport = MockTransport::new();
    let remote = remote(&transport);
    let payload = json!({"title": "first"});

    let outcome = remote.apply("items/1", MutationKind::Apply, Some(&payload)).await;

    assert_eq!(outcome, ApplyOutcome::Applied);
    assert_eq!(
        transport.sent(),
        vec![ClientMessage::Apply { request_id: 1, path: "items/1".into(), payload }]
    );
    assert_eq!(remote.state().await, ConnectionState::Connected);
}

#[tokio::test]
async fn delete_is_sent_without_payload() {
    let transport = MockTransport::new();
    let remote = remote(&transport);

    let outcome = remote.apply("items/2", MutationKind::Delete, None).await;

    assert!(outcome.is_applied());
    assert_eq!(transport.sent(), vec![ClientMessage::Delete { request_id: 1, path: "items/2".into() }]);
}

#[tokio::test]
async fn requests_reuse_the_connection() {
    let transport = MockTransport::new();
    let remote = remote(&transport);

    remote.apply("a", MutationKind::Delete, None).await;
    remote.apply("b", MutationKind::Delete, None).await;

    assert_eq!(transport.connects(), 1);
    let ids: Vec<_> = transport.sent().iter().filter_map(|m| m.request_id()).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[parameterized(
    unavailable = { RejectCode::Unavailable, true },
    timeout = { RejectCode::Timeout, true },
    internal = { RejectCode::Internal, true },
    invalid_path = { RejectCode::InvalidPath, false },
    validation = { RejectCode::Validation, false },
    permission_denied = { RejectCode::PermissionDenied, false },
)]
#[test_macro(tokio::test)]
async fn rejection_classified_by_code(code: RejectCode, retryable: bool) {
    let transport = MockTransport::new();
    transport.script(vec![Reply::Reject(code, "refused")]);
    let remote = remote(&transport);

    let outcome = remote.apply("items/1", MutationKind::Delete, None).await;

    let detail = format!("{code}: refused");
    if retryable {
        assert_eq!(outcome, ApplyOutcome::Retryable(detail));
    } else {
        assert_eq!(outcome, ApplyOutcome::Terminal(detail));
    }
}

#[parameterized(
    empty = { "" },
    leading_slash = { "/items/1" },
    double_slash = { "items//1" },
    forbidden_char = { "items/#1" },
)]
#[test_macro(tokio::test)]
async fn malformed_path_is_terminal_without_io(path: &str) {
    let transport = MockTransport::new();
    let remote = remote(&transport);

    let outcome = remote.apply(path, MutationKind::Delete, None).await;

    assert!(matches!(outcome, ApplyOutcome::Terminal(_)));
    assert_eq!(transport.connects(), 0);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn unrelated_messages_are_skipped() {
    let transport = MockTransport::new();
    transport.script(vec![Reply::NoisyAck]);
    let remote = remote(&transport);

    let outcome = remote.apply("items/1", MutationKind::Delete, None).await;

    assert_eq!(outcome, ApplyOutcome::Applied);
}

#[tokio::test(start_paused = true)]
async fn silence_times_out_as_retryable() {
    let transport = MockTransport::new();
    transport.script(vec![Reply::Silence]);
    let remote = remote(&transport);

    let outcome = remote.apply("items/1", MutationKind::Delete, None).await;

    assert_eq!(outcome, ApplyOutcome::Retryable("no reply within 5000ms".into()));
    assert_eq!(remote.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn closed_connection_is_retryable_and_reconnects() {
    let transport = MockTransport::new();
    transport.script(vec![Reply::Close]);
    let remote = remote(&transport);

    let first = remote.apply("items/1", MutationKind::Delete, None).await;
    assert!(matches!(first, ApplyOutcome::Retryable(_)));

    let second = remote.apply("items/1", MutationKind::Delete, None).await;
    assert_eq!(second, ApplyOutcome::Applied);
    assert_eq!(transport.connects(), 2);
}

#[tokio::test]
async fn send_failure_is_retryable() {
    let transport = MockTransport::new();
    transport.script(vec![Reply::SendFail]);
    let remote = remote(&transport);

    let outcome = remote.apply("items/1", MutationKind::Delete, None).await;

    assert!(matches!(outcome, ApplyOutcome::Retryable(_)));
    assert_eq!(remote.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn server_error_is_retryable() {
    let transport = MockTransport::new();
    transport.script(vec![Reply::ServerError("overloaded")]);
    let remote = remote(&transport);

    let outcome = remote.apply("items/1", MutationKind::Delete, None).await;

    assert_eq!(outcome.detail(), Some("receive failed: remote error: overloaded"));
}

#[tokio::test(start_paused = true)]
async fn connect_retries_with_backoff() {
    let transport = MockTransport::new();
    transport.fail_connects(2);
    let remote = remote(&transport);

    let outcome = remote.apply("items/1", MutationKind::Delete, None).await;

    assert_eq!(outcome, ApplyOutcome::Applied);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_connect_retries_are_retryable() {
    let transport = MockTransport::new();
    transport.fail_connects(3);
    let remote = remote(&transport);

    let outcome = remote.apply("items/1", MutationKind::Delete, None).await;

    assert_eq!(
        outcome,
        ApplyOutcome::Retryable("remote unreachable: connection failed: mock failure".into())
    );
    assert_eq!(remote.state().await, ConnectionState::Disconnected);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn explicit_disconnect_forces_reconnect() {
    let transport = MockTransport::new();
    let remote = remote(&transport);

    remote.apply("a", MutationKind::Delete, None).await;
    remote.disconnect().await;
    assert_eq!(remote.state().await, ConnectionState::Disconnected);

    remote.apply("b", MutationKind::Delete, None).await;
    assert_eq!(transport.connects(), 2);
}

#[test]
fn outcome_detail() {
    assert_eq!(ApplyOutcome::Applied.detail(), None);
    assert_eq!(ApplyOutcome::Retryable("down".into()).detail(), Some("down"));
    assert_eq!(ApplyOutcome::Terminal("bad".into()).detail(), Some("bad"));
}

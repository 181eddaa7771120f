//! III. Retry classification tests.
//!
//! Rules covered:
//! - 7. Permanent remote failures leave the queue
//! - 8. Transient remote failures stay queued
//! - 9. Text-only failures are classified the same way every time

use super::harness::{enqueue_deletes, flaky_engine, targets, ScriptedRemote};
use crate::{
    classify_message, should_retry, RemoteError, RemoteErrorKind, RemoteProcessor, SyncOutcome,
};
use std::sync::Arc;

fn failure(kind: RemoteErrorKind) -> Result<(), RemoteError> {
    Err(RemoteError::new(kind, kind.as_str()))
}

/// Rule 7: Permanent remote failures leave the queue
#[tokio::test]
async fn rule_7_permanent_failures_are_dropped() {
    let (_, engine) = flaky_engine();
    enqueue_deletes(engine.queue(), &["auth", "token", "rls", "dup", "shape"]);

    let remote = Arc::new(ScriptedRemote::new(vec![
        failure(RemoteErrorKind::Unauthenticated),
        failure(RemoteErrorKind::InvalidToken),
        failure(RemoteErrorKind::PermissionDenied),
        failure(RemoteErrorKind::ConstraintViolation),
        failure(RemoteErrorKind::InvalidPayload),
    ]));
    let outcome = engine.flush(Arc::new(RemoteProcessor::new(remote))).await;

    assert_eq!(outcome, SyncOutcome { processed: 5, remaining: 0 });
    assert!(engine.queue().is_empty());
}

/// Rule 8: Transient remote failures stay queued
#[tokio::test]
async fn rule_8_transient_failures_are_kept() {
    let (_, engine) = flaky_engine();
    enqueue_deletes(engine.queue(), &["net", "ok", "slow", "busy", "boom", "odd"]);

    let remote = Arc::new(ScriptedRemote::new(vec![
        failure(RemoteErrorKind::Network),
        Ok(()),
        failure(RemoteErrorKind::Timeout),
        failure(RemoteErrorKind::RateLimited),
        failure(RemoteErrorKind::Server),
        failure(RemoteErrorKind::Unknown),
    ]));
    let outcome = engine.flush(Arc::new(RemoteProcessor::new(remote))).await;

    assert_eq!(outcome, SyncOutcome { processed: 1, remaining: 5 });
    assert_eq!(
        targets(&engine.queue().read_all()),
        vec!["net", "slow", "busy", "boom", "odd"]
    );
}

/// Rule 9: Text-only failures are classified the same way every time
#[tokio::test]
async fn rule_9_message_classification_is_stable() {
    let (_, engine) = flaky_engine();
    enqueue_deletes(engine.queue(), &["a", "b"]);

    let messages = ["JWT expired", "TypeError: Failed to fetch"];
    let remote = Arc::new(ScriptedRemote::new(
        messages
            .iter()
            .map(|message| Err(RemoteError::from_message(*message)))
            .collect(),
    ));
    engine.flush(Arc::new(RemoteProcessor::new(remote))).await;

    assert_eq!(targets(&engine.queue().read_all()), vec!["b"]);
    for message in messages {
        assert_eq!(classify_message(message), classify_message(message));
        assert_eq!(should_retry(message), classify_message(message).is_retryable());
    }
}

//! I. Replay order tests.
//!
//! Rules covered:
//! - 1. Operations reach the processor in enqueue order
//! - 2. Retried operations keep their relative order
//! - 3. Retried operations stay ahead of operations enqueued later

use super::harness::{enqueue_deletes, flaky_engine, targets, RecordingProcessor};
use crate::SyncOutcome;
use std::sync::Arc;

/// Rule 1: Operations reach the processor in enqueue order
#[tokio::test]
async fn rule_1_replays_in_enqueue_order() {
    let (_, engine) = flaky_engine();
    let queued = enqueue_deletes(engine.queue(), &["a", "b", "c", "d", "e"]);

    let processor = Arc::new(RecordingProcessor::new());
    let outcome = engine.flush(processor.clone()).await;

    assert_eq!(outcome, SyncOutcome { processed: 5, remaining: 0 });
    assert_eq!(processor.seen(), queued);
}

/// Rule 2: Retried operations keep their relative order
#[tokio::test]
async fn rule_2_retried_operations_keep_order() {
    let (_, engine) = flaky_engine();
    enqueue_deletes(engine.queue(), &["a", "b", "c", "d"]);

    let processor = Arc::new(RecordingProcessor::new().retry("a").retry("c"));
    let outcome = engine.flush(processor).await;

    assert_eq!(outcome, SyncOutcome { processed: 2, remaining: 2 });
    assert_eq!(targets(&engine.queue().read_all()), vec!["a", "c"]);
}

/// Rule 3: Retried operations stay ahead of operations enqueued later
#[tokio::test]
async fn rule_3_retried_before_newer() {
    let (_, engine) = flaky_engine();
    enqueue_deletes(engine.queue(), &["old-1", "old-2"]);

    engine
        .flush(Arc::new(RecordingProcessor::new().retry("old-1").retry("old-2")))
        .await;
    enqueue_deletes(engine.queue(), &["new-1"]);

    let processor = Arc::new(RecordingProcessor::new());
    engine.flush(processor.clone()).await;

    assert_eq!(targets(&processor.seen()), vec!["old-1", "old-2", "new-1"]);
    assert!(engine.queue().is_empty());
}

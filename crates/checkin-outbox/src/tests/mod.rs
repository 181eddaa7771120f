//! Behavioral tests for the offline queue.
//!
//! Test organization follows the queue's guarantees:
//!
//! - `harness.rs`             - Flaky store, recording processor, scripted remote
//! - `ordering.rs`            - I. Replay order (Rules 1-3)
//! - `write_back.rs`          - II. All-or-nothing write-back (Rules 4-6)
//! - `classification.rs`      - III. Retry classification through the remote processor (Rules 7-9)
//! - `forward_progress.rs`    - IV. Forward progress past failures (Rules 10-12)
//! - `coalescing.rs`          - V. Concurrent flush coalescing (Rules 13-16)
//! - `enqueue_during_flush.rs` - VI. Enqueue during flush (Rules 17-19)
//! - `empty.rs`               - VII. Empty queue (Rules 20-21)
//! - `recovery.rs`            - VIII. Corrupted store recovery (Rules 22-24)
//! - `bridge.rs`              - IX. Connectivity triggers and shutdown (Rules 25-30)
//! - `writer.rs`              - X. Direct write dispositions (Rules 31-36)

mod classification;
pub(crate) mod harness;
mod ordering;

//! Offline-first write path for check-ins.
//!
//! This crate provides:
//! - QueueStore: FIFO queue of pending writes persisted in a local key-value store
//! - SyncEngine: coalesced drain of the queue through an operation processor
//! - RemoteErrorKind / classify_message: retryable vs. permanent remote failures
//! - ConnectivityBridge: flushes the queue when the device comes back online
//! - DirectWriter: write-through when online, queue-on-failure otherwise

mod bridge;
mod classify;
mod connectivity;
mod engine;
mod error;
mod model;
mod queue;
mod remote;
mod writer;

#[cfg(test)]
mod tests;

pub use bridge::{BridgeHandle, ConnectivityBridge, FlushTrigger, TRIGGER_QUEUE_CAPACITY};
pub use classify::{classify_message, should_retry, RemoteError, RemoteErrorKind, RemoteResult};
pub use connectivity::{ConnectivityMonitor, NetworkStatus};
pub use engine::{OperationProcessor, SyncEngine};
pub use error::{OutboxError, OutboxResult, ValidationError};
pub use model::{Checkin, OperationKind, QueuedOperation, SyncOutcome};
pub use queue::QueueStore;
pub use remote::{RemoteCheckinStore, RemoteProcessor};
pub use writer::{DirectWriter, WriteDisposition};

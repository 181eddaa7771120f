//! Durable offline queue over a local key-value store.

use crate::{OperationKind, OutboxResult, QueuedOperation};
use checkin_local_store::KeyValueStore;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// FIFO list of pending operations, persisted as one JSON array under one key.
///
/// Reads never fail: a missing, unreadable, or corrupted value is an empty
/// queue. Every read-modify-write runs under a lock shared by all clones of
/// the store, so an append can't interleave with a flush write-back.
#[derive(Clone)]
pub struct QueueStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Arc<Mutex<()>>,
}

impl QueueStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The store key holding the queue.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the whole queue in enqueue order.
    pub fn read_all(&self) -> Vec<QueuedOperation> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read offline queue, treating as empty");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(key = %self.key, "Offline queue is not an array, treating as empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Offline queue is corrupted, treating as empty");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(op) => Some(op),
                Err(e) => {
                    warn!(key = %self.key, index, error = %e, "Skipping undecodable queued operation");
                    None
                }
            })
            .collect()
    }

    /// Replace the whole persisted queue.
    pub fn write_all(&self, ops: &[QueuedOperation]) -> OutboxResult<()> {
        let _guard = self.write_lock.lock();
        self.persist(ops)
    }

    /// Add one operation at the back of the queue.
    pub fn append(&self, op: QueuedOperation) -> OutboxResult<()> {
        let _guard = self.write_lock.lock();
        let mut ops = self.read_all();
        debug!(operation_id = %op.id(), kind = op.label(), position = ops.len(), "Appending to offline queue");
        ops.push(op);
        self.persist(&ops)
    }

    /// Create a new operation and append it.
    ///
    /// A persistence failure is logged and reported as `None`; it never
    /// reaches the caller as an error.
    pub fn enqueue(&self, kind: OperationKind) -> Option<QueuedOperation> {
        let op = QueuedOperation::new(kind);
        match self.append(op.clone()) {
            Ok(()) => Some(op),
            Err(e) => {
                error!(
                    key = %self.key,
                    operation_id = %op.id(),
                    kind = op.label(),
                    error = %e,
                    "Failed to persist queued operation, dropping it"
                );
                None
            }
        }
    }

    /// Remove `processed` ids from the current queue in one write.
    ///
    /// Entries not in `processed`, including ones appended after a flush
    /// snapshot, keep their order. Returns the new queue length. On error
    /// nothing is changed.
    pub fn retain_unprocessed(&self, processed: &HashSet<String>) -> OutboxResult<usize> {
        let _guard = self.write_lock.lock();
        let mut ops = self.read_all();
        ops.retain(|op| !processed.contains(op.id()));
        self.persist(&ops)?;
        Ok(ops.len())
    }

    pub fn len(&self) -> usize {
        self.read_all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queued operation.
    pub fn clear(&self) -> OutboxResult<()> {
        self.write_all(&[])
    }

    fn persist(&self, ops: &[QueuedOperation]) -> OutboxResult<()> {
        let raw = serde_json::to_string(ops)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }
}

impl std::fmt::Debug for QueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

//! Test harness for offline queue tests.
//!
//! Provides:
//! - FlakyStore: in-memory key-value store with injectable write failures
//! - RecordingProcessor: processor that records calls, with scripted retries and an optional gate
//! - ScriptedRemote: remote check-in store replaying scripted results

use crate::{
    OperationKind, OperationProcessor, QueueStore, QueuedOperation, RemoteCheckinStore,
    RemoteResult, SyncEngine, SyncOutcome,
};
use async_trait::async_trait;
use checkin_local_store::{KeyValueStore, MemoryKeyValueStore, StoreError, StoreResult};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify, Semaphore};

pub const QUEUE_KEY: &str = "checkin-offline-queue";

/// Key-value store whose next `set` calls can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryKeyValueStore,
    failing_sets: AtomicUsize,
    set_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` writes.
    pub fn fail_next_sets(&self, count: usize) {
        self.failing_sets.store(count, Ordering::SeqCst);
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Write a raw value, bypassing failure injection.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.inner.set(key, value).unwrap();
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).unwrap()
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .failing_sets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StoreError::WriteRejected("quota exceeded".to_string()));
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        self.inner.delete(key)
    }
}

/// Engine over a fresh [`FlakyStore`].
pub fn flaky_engine() -> (Arc<FlakyStore>, SyncEngine) {
    let store = Arc::new(FlakyStore::new());
    let engine = SyncEngine::new(QueueStore::new(store.clone(), QUEUE_KEY));
    (store, engine)
}

pub fn delete_op(target: &str) -> OperationKind {
    OperationKind::Delete {
        target_id: target.to_string(),
    }
}

/// Enqueue one delete per target and return the queued operations.
pub fn enqueue_deletes(queue: &QueueStore, targets: &[&str]) -> Vec<QueuedOperation> {
    targets
        .iter()
        .map(|target| queue.enqueue(delete_op(target)).unwrap())
        .collect()
}

pub fn targets(ops: &[QueuedOperation]) -> Vec<String> {
    ops.iter()
        .map(|op| op.target_id().unwrap_or_default().to_string())
        .collect()
}

/// Processor that records every call.
///
/// Operations whose target is marked with [`RecordingProcessor::retry`] are
/// reported as retryable; all others are processed. A gated processor
/// waits for a permit before answering each call.
#[derive(Default)]
pub struct RecordingProcessor {
    seen: Mutex<Vec<QueuedOperation>>,
    retry_targets: Mutex<HashSet<String>>,
    gate: Option<Semaphore>,
    started: Notify,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn retry(self, target: &str) -> Self {
        self.retry_targets.lock().insert(target.to_string());
        self
    }

    /// Let `count` gated calls finish.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Wait until at least one call has started.
    pub async fn wait_started(&self) {
        tokio::time::timeout(Duration::from_secs(2), self.started.notified())
            .await
            .expect("processor was never called");
    }

    pub fn seen(&self) -> Vec<QueuedOperation> {
        self.seen.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl OperationProcessor for RecordingProcessor {
    async fn process(&self, op: QueuedOperation) -> bool {
        let target = op.target_id().unwrap_or_default().to_string();
        self.seen.lock().push(op);
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        !self.retry_targets.lock().contains(&target)
    }
}

/// Remote store answering from a script, then with a default result.
pub struct ScriptedRemote {
    script: Mutex<VecDeque<RemoteResult<()>>>,
    fallback: RemoteResult<()>,
    applied: Mutex<Vec<QueuedOperation>>,
}

impl ScriptedRemote {
    pub fn new(script: Vec<RemoteResult<()>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Ok(()),
            applied: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `result`.
    pub fn always(result: RemoteResult<()>) -> Self {
        Self {
            fallback: result,
            ..Self::new(Vec::new())
        }
    }

    /// Every operation passed to `apply`, in call order.
    pub fn applied(&self) -> Vec<QueuedOperation> {
        self.applied.lock().clone()
    }
}

#[async_trait]
impl RemoteCheckinStore for ScriptedRemote {
    async fn apply(&self, op: &QueuedOperation) -> RemoteResult<()> {
        self.applied.lock().push(op.clone());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Wait for the next published outcome that satisfies `pred`.
pub async fn wait_for_outcome(
    rx: &mut watch::Receiver<Option<SyncOutcome>>,
    pred: impl FnMut(&Option<SyncOutcome>) -> bool,
) -> SyncOutcome {
    let outcome = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("timed out waiting for flush outcome")
        .expect("bridge dropped outcome channel");
    (*outcome).expect("outcome missing")
}

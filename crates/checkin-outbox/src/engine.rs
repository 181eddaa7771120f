//! Coalesced queue drain.
//!
//! At most one drain runs per engine. A flush requested while one is in
//! flight joins it and resolves to the same outcome instead of starting a
//! second pass over the queue.

use crate::{QueueStore, QueuedOperation, SyncOutcome};
use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Attempts one queued operation.
///
/// Returns `true` when the operation should leave the queue (delivered, or
/// permanently rejected) and `false` when it should be retried later.
#[async_trait]
pub trait OperationProcessor: Send + Sync {
    async fn process(&self, op: QueuedOperation) -> bool;
}

#[async_trait]
impl<F, Fut> OperationProcessor for F
where
    F: Fn(QueuedOperation) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn process(&self, op: QueuedOperation) -> bool {
        (self)(op).await
    }
}

type SharedFlush = Shared<BoxFuture<'static, SyncOutcome>>;

struct EngineInner {
    queue: QueueStore,
    in_flight: Mutex<Option<SharedFlush>>,
}

/// Clears the in-flight slot when a drain ends, including by panic.
struct InFlightGuard {
    inner: Arc<EngineInner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.lock().take();
    }
}

/// Drains a [`QueueStore`] through an [`OperationProcessor`].
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    pub fn new(queue: QueueStore) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                queue,
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn queue(&self) -> &QueueStore {
        &self.inner.queue
    }

    /// Whether a drain is currently running.
    pub fn is_flushing(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// Drain the queue, or join the drain already in progress.
    ///
    /// The joining decision is made when this is called, not when the
    /// returned future is first polled. The drain itself runs on a spawned
    /// task, so dropping the returned future does not cancel it. Must be
    /// called from within a Tokio runtime.
    ///
    /// Each operation in the snapshot taken at drain start is attempted once,
    /// in order. Processed ids are then removed from the queue in a single
    /// write-back; operations appended meanwhile are untouched. If the
    /// write-back fails, nothing is removed and the outcome reports zero
    /// processed.
    pub fn flush(
        &self,
        processor: Arc<dyn OperationProcessor>,
    ) -> impl Future<Output = SyncOutcome> + Send + 'static {
        let mut slot = self.inner.in_flight.lock();
        if let Some(existing) = slot.as_ref() {
            debug!("Flush already in progress, joining it");
            return existing.clone();
        }

        // Spawned while the slot is locked so the guard can't clear it first.
        let guard = InFlightGuard {
            inner: self.inner.clone(),
        };
        let handle = tokio::spawn(async move {
            let guard = guard;
            drain(&guard.inner.queue, processor.as_ref()).await
        });

        let queue = self.inner.queue.clone();
        let shared = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "Queue drain task failed");
                    SyncOutcome {
                        processed: 0,
                        remaining: queue.len(),
                    }
                }
            }
        }
        .boxed()
        .shared();

        *slot = Some(shared.clone());
        shared
    }

    /// [`SyncEngine::flush`] with an owned processor.
    pub fn flush_with(
        &self,
        processor: impl OperationProcessor + 'static,
    ) -> impl Future<Output = SyncOutcome> + Send + 'static {
        self.flush(Arc::new(processor))
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("queue", &self.inner.queue)
            .field("flushing", &self.is_flushing())
            .finish()
    }
}

async fn drain(queue: &QueueStore, processor: &dyn OperationProcessor) -> SyncOutcome {
    let snapshot = queue.read_all();
    if snapshot.is_empty() {
        debug!("Offline queue empty, nothing to flush");
        return SyncOutcome::default();
    }

    let total = snapshot.len();
    info!(operations = total, "Flushing offline queue");

    let mut processed = HashSet::with_capacity(total);
    for op in snapshot {
        let id = op.id().to_string();
        if processor.process(op).await {
            processed.insert(id);
        }
    }

    if processed.is_empty() {
        info!(remaining = total, "Flush made no progress");
        return SyncOutcome {
            processed: 0,
            remaining: total,
        };
    }

    match queue.retain_unprocessed(&processed) {
        Ok(queued) => {
            let outcome = SyncOutcome {
                processed: processed.len(),
                remaining: total - processed.len(),
            };
            info!(
                processed = outcome.processed,
                remaining = outcome.remaining,
                queued,
                "Flush complete"
            );
            outcome
        }
        Err(e) => {
            error!(error = %e, operations = total, "Failed to write back offline queue, keeping all operations");
            SyncOutcome {
                processed: 0,
                remaining: total,
            }
        }
    }
}

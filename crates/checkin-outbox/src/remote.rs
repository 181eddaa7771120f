//! Remote check-in store port and the processor that drives it.

use crate::{OperationProcessor, QueuedOperation, RemoteResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// The authoritative remote store for check-ins.
///
/// `apply` must be idempotent per operation id: replaying the same queued
/// operation after a lost response must not create a second row.
#[async_trait]
pub trait RemoteCheckinStore: Send + Sync {
    /// Apply one queued operation.
    async fn apply(&self, op: &QueuedOperation) -> RemoteResult<()>;

    /// Cheap reachability check used by connectivity probing.
    async fn ping(&self) -> bool {
        true
    }
}

/// Adapts a [`RemoteCheckinStore`] to the sync engine's processor contract.
///
/// Delivered and permanently rejected operations both count as processed;
/// only retryable failures stay queued.
#[derive(Clone)]
pub struct RemoteProcessor {
    remote: Arc<dyn RemoteCheckinStore>,
}

impl RemoteProcessor {
    pub fn new(remote: Arc<dyn RemoteCheckinStore>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl OperationProcessor for RemoteProcessor {
    async fn process(&self, op: QueuedOperation) -> bool {
        match self.remote.apply(&op).await {
            Ok(()) => {
                debug!(operation_id = %op.id(), kind = op.label(), "Queued operation delivered");
                true
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    operation_id = %op.id(),
                    kind = op.label(),
                    error_kind = %e.kind,
                    error = %e.message,
                    "Queued operation failed, keeping it for retry"
                );
                false
            }
            Err(e) => {
                warn!(
                    operation_id = %op.id(),
                    kind = op.label(),
                    error_kind = %e.kind,
                    error = %e.message,
                    "Queued operation permanently rejected, dropping it"
                );
                true
            }
        }
    }
}

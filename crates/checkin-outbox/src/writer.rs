//! Write-through with offline fallback.

use crate::{
    Checkin, FlushTrigger, NetworkStatus, OperationKind, QueueStore, QueuedOperation,
    RemoteCheckinStore, RemoteError,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What happened to a write submitted through [`DirectWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteDisposition {
    /// Applied to the remote store.
    Delivered,
    /// Persisted in the offline queue for later delivery.
    Queued(QueuedOperation),
    /// Permanently refused by the remote store; nothing was queued.
    Rejected(RemoteError),
    /// Could not be sent or persisted.
    Lost,
}

impl WriteDisposition {
    /// Whether the write is either applied or safely queued.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Delivered | Self::Queued(_))
    }
}

/// Sends writes straight to the remote store when online and falls back to
/// the offline queue otherwise.
///
/// The [`QueuedOperation`] is built before the first attempt, so a write
/// that reached the remote store but lost its response replays with the
/// same id.
pub struct DirectWriter {
    queue: QueueStore,
    remote: Arc<dyn RemoteCheckinStore>,
    network: Arc<dyn NetworkStatus>,
    trigger: Option<FlushTrigger>,
}

impl DirectWriter {
    pub fn new(
        queue: QueueStore,
        remote: Arc<dyn RemoteCheckinStore>,
        network: Arc<dyn NetworkStatus>,
    ) -> Self {
        Self {
            queue,
            remote,
            network,
            trigger: None,
        }
    }

    /// Request a flush whenever a write is queued while online.
    pub fn with_trigger(mut self, trigger: FlushTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub async fn write(&self, kind: OperationKind) -> WriteDisposition {
        let op = QueuedOperation::new(kind);

        if !self.network.is_online() {
            debug!(operation_id = %op.id(), kind = op.label(), "Offline, queueing write");
            return self.defer(op, false);
        }

        match self.remote.apply(&op).await {
            Ok(()) => {
                debug!(operation_id = %op.id(), kind = op.label(), "Write delivered");
                WriteDisposition::Delivered
            }
            Err(e) if e.is_retryable() => {
                info!(
                    operation_id = %op.id(),
                    kind = op.label(),
                    error_kind = %e.kind,
                    error = %e.message,
                    "Write failed, queueing for retry"
                );
                self.defer(op, true)
            }
            Err(e) => {
                warn!(
                    operation_id = %op.id(),
                    kind = op.label(),
                    error_kind = %e.kind,
                    error = %e.message,
                    "Write rejected by remote store"
                );
                WriteDisposition::Rejected(e)
            }
        }
    }

    pub async fn create(&self, payload: Checkin) -> WriteDisposition {
        self.write(OperationKind::Create { payload }).await
    }

    pub async fn update(&self, target_id: impl Into<String>, payload: Checkin) -> WriteDisposition {
        self.write(OperationKind::Update {
            target_id: target_id.into(),
            payload,
        })
        .await
    }

    pub async fn delete(&self, target_id: impl Into<String>) -> WriteDisposition {
        self.write(OperationKind::Delete {
            target_id: target_id.into(),
        })
        .await
    }

    fn defer(&self, op: QueuedOperation, online: bool) -> WriteDisposition {
        if let Err(e) = self.queue.append(op.clone()) {
            error!(
                operation_id = %op.id(),
                kind = op.label(),
                error = %e,
                "Failed to queue write, it is lost"
            );
            return WriteDisposition::Lost;
        }

        if online {
            if let Some(trigger) = &self.trigger {
                trigger.request_flush();
            }
        }
        WriteDisposition::Queued(op)
    }
}

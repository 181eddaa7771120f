//! Connectivity-driven flush scheduling.
//!
//! The bridge watches a [`NetworkStatus`] and an explicit trigger channel and
//! hands every trigger to [`SyncEngine::flush`]. Flushes are spawned so the
//! loop keeps observing signals while a drain runs; overlapping triggers
//! coalesce in the engine.

use crate::{NetworkStatus, OperationProcessor, SyncEngine, SyncOutcome};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffered explicit flush requests. Requests beyond this are folded into
/// the ones already pending.
pub const TRIGGER_QUEUE_CAPACITY: usize = 8;

/// Cloneable, non-blocking handle for requesting a flush.
#[derive(Clone, Debug)]
pub struct FlushTrigger {
    sender: mpsc::Sender<()>,
}

impl FlushTrigger {
    /// A trigger not attached to a bridge, plus the receiving end.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::Receiver<()>) {
        let (sender, receiver) = mpsc::channel(TRIGGER_QUEUE_CAPACITY);
        (Self { sender }, receiver)
    }

    /// Ask the bridge to flush. Returns `false` once the bridge has stopped.
    pub fn request_flush(&self) -> bool {
        match self.sender.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                debug!("Flush already requested, coalescing");
                true
            }
            Err(TrySendError::Closed(())) => {
                debug!("Flush requested after bridge shutdown");
                false
            }
        }
    }
}

/// Wires a network signal and explicit triggers to a [`SyncEngine`].
pub struct ConnectivityBridge {
    engine: SyncEngine,
    processor: Arc<dyn OperationProcessor>,
    network: Arc<dyn NetworkStatus>,
}

impl ConnectivityBridge {
    pub fn new(
        engine: SyncEngine,
        processor: Arc<dyn OperationProcessor>,
        network: Arc<dyn NetworkStatus>,
    ) -> Self {
        Self {
            engine,
            processor,
            network,
        }
    }

    /// Subscribe to the network signal and start the bridge loop.
    ///
    /// Flushes immediately if already online.
    pub fn start(self) -> BridgeHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = watch::channel(None);

        let bridge_loop = BridgeLoop {
            engine: self.engine,
            processor: self.processor,
            status: self.network.subscribe(),
            outcomes: Arc::new(outcome_tx),
        };
        let task = tokio::spawn(bridge_loop.run(trigger_rx, shutdown_rx));

        BridgeHandle {
            trigger: FlushTrigger { sender: trigger_tx },
            outcomes: outcome_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Owner of a running bridge.
///
/// Dropping the handle stops the loop without waiting for it; use
/// [`BridgeHandle::shutdown`] to wait until the network subscription is
/// released.
pub struct BridgeHandle {
    trigger: FlushTrigger,
    outcomes: watch::Receiver<Option<SyncOutcome>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl BridgeHandle {
    pub fn trigger(&self) -> FlushTrigger {
        self.trigger.clone()
    }

    /// Latest flush outcome; `None` until the first flush started by the
    /// bridge completes.
    pub fn outcomes(&self) -> watch::Receiver<Option<SyncOutcome>> {
        self.outcomes.clone()
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// Flushes already started keep running to completion.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Connectivity bridge task failed");
            }
        }
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

struct BridgeLoop {
    engine: SyncEngine,
    processor: Arc<dyn OperationProcessor>,
    status: watch::Receiver<bool>,
    outcomes: Arc<watch::Sender<Option<SyncOutcome>>>,
}

impl BridgeLoop {
    async fn run(mut self, mut triggers: mpsc::Receiver<()>, mut shutdown: oneshot::Receiver<()>) {
        let mut online = *self.status.borrow_and_update();
        let mut status_open = true;
        info!(online, "Connectivity bridge started");

        if online {
            self.spawn_flush("startup");
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                changed = self.status.changed(), if status_open => {
                    match changed {
                        Ok(()) => {
                            let now_online = *self.status.borrow_and_update();
                            if now_online && !online {
                                self.spawn_flush("reconnected");
                            }
                            online = now_online;
                        }
                        Err(_) => {
                            debug!("Network status source closed");
                            status_open = false;
                        }
                    }
                }
                request = triggers.recv() => {
                    match request {
                        Some(()) => self.spawn_flush("requested"),
                        None => break,
                    }
                }
            }
        }

        info!("Connectivity bridge stopped");
    }

    fn spawn_flush(&self, reason: &'static str) {
        debug!(reason, "Starting queue flush");
        let flush = self.engine.flush(self.processor.clone());
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let outcome = flush.await;
            outcomes.send_replace(Some(outcome));
        });
    }
}

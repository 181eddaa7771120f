//! Network status signal.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Source of online/offline state.
///
/// Subscribers get a [`watch::Receiver`]; dropping it unsubscribes.
pub trait NetworkStatus: Send + Sync {
    fn is_online(&self) -> bool;

    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Settable network status, fed by platform events or a reachability probe.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    /// Record the current state. Returns `true` if it changed.
    ///
    /// Subscribers are only woken on an actual change, so repeated reports
    /// of the same state never fan out.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "Connectivity changed");
        }
        changed
    }

    /// Live subscriptions, for observing release.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl NetworkStatus for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("online", &self.is_online())
            .finish()
    }
}

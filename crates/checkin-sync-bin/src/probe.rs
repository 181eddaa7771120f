//! Reachability probe feeding the connectivity monitor.

use checkin_outbox::{ConnectivityMonitor, RemoteCheckinStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Ping `remote` every `every` and record the result in `monitor`.
///
/// Runs until the task is aborted.
pub async fn run(
    remote: Arc<dyn RemoteCheckinStore>,
    monitor: ConnectivityMonitor,
    every: Duration,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let reachable = remote.ping().await;
        if !monitor.set_online(reachable) {
            debug!(reachable, "Connectivity unchanged");
        }
    }
}

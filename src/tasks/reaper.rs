//! Expiry Reaper Task
//!
//! Background task that periodically deletes expired rows from a store's
//! table. This is the only path that physically removes expired entries
//! that are never read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::entry::unix_now;
use crate::storage::store::Table;

/// Spawns the reaper for `table` on `runtime`.
///
/// The first sweep runs one full `interval` after spawning. Each wake either
/// sweeps with the wake time as "now" or, once `shutdown` is cancelled, exits.
/// Sweep failures are logged and the reaper keeps ticking.
///
/// # Returns
/// A JoinHandle for the spawned task.
pub(crate) fn spawn_reaper(
    runtime: &Handle,
    table: Arc<Table>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!(
            table = %table.name(),
            interval_ms = interval.as_millis() as u64,
            "Starting expiry reaper"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let now = unix_now();
            let sweep_table = Arc::clone(&table);
            let outcome =
                tokio::task::spawn_blocking(move || sweep_table.sweep_expired(now)).await;

            match outcome {
                Ok(Ok(0)) => debug!(table = %table.name(), "Expiry sweep: nothing to remove"),
                Ok(Ok(removed)) => {
                    info!(table = %table.name(), removed, "Expiry sweep removed expired entries")
                }
                Ok(Err(e)) => warn!(table = %table.name(), error = %e, "Expiry sweep failed"),
                Err(e) => warn!(table = %table.name(), error = %e, "Expiry sweep task panicked"),
            }
        }

        info!(table = %table.name(), "Expiry reaper stopped");
    })
}

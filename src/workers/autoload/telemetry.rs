// Package autoload provides telemetry for the refresh workers.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::metrics;
use crate::registry::AutoLoadRegistry;

use super::counters::Counters;

/// Periodically logs and exports refresh counters until cancelled.
pub async fn logger(
    shutdown_token: CancellationToken,
    counters: Arc<Counters>,
    registry: Arc<AutoLoadRegistry>,
    w_num_active: Arc<AtomicI64>,
    each: Duration,
) {
    let mut ticker = interval(each);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                tracing::debug!(component = "autoload", event = "telemetry_stopped", "logger stopped");
                return;
            }
            _ = ticker.tick() => {
                let workers = w_num_active.load(Ordering::Relaxed);
                let entries = registry.size();
                let stats = counters.reset();

                metrics::add_autoload_stat_counters(&stats);
                metrics::set_registry_size(entries);
                metrics::set_refreshers(workers);

                tracing::info!(
                    component = "autoload",
                    event = "stats",
                    refreshers = workers,
                    entries = entries,
                    loaded = stats.loaded,
                    errors = stats.errors,
                    slow = stats.slow,
                    adopted = stats.adopted,
                    skipped = stats.skipped,
                    demoted = stats.demoted,
                    sweeps = stats.sweeps,
                    "autoload stats"
                );
            }
        }
    }
}

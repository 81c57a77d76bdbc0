// Package autoload provides the sweep dispatcher.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::model::AutoLoadEntry;
use crate::registry::{AutoLoadRegistry, SortType};

use super::counters::Counters;

/// Feeds registry snapshots to the refreshers, one sweep at a time.
pub struct Dispatcher {
    registry: Arc<AutoLoadRegistry>,
    w_tasks_tx: mpsc::Sender<Arc<AutoLoadEntry>>,
    sort_type: SortType,
    idle_interval: Duration,
    counters: Arc<Counters>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<AutoLoadRegistry>,
        w_tasks_tx: mpsc::Sender<Arc<AutoLoadEntry>>,
        sort_type: SortType,
        idle_interval: Duration,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            registry,
            w_tasks_tx,
            sort_type,
            idle_interval,
            counters,
        }
    }

    /// Entries enqueued but not yet taken by a refresher.
    pub fn pending(&self) -> usize {
        self.w_tasks_tx.max_capacity() - self.w_tasks_tx.capacity()
    }

    /// Runs until `ctx` is cancelled.
    ///
    /// A new sweep starts only once every entry of the previous one has been
    /// taken off the queue. Sends block while the queue is full.
    pub async fn run(self, ctx: CancellationToken) {
        loop {
            if ctx.is_cancelled() {
                return;
            }
            if self.registry.is_empty() || self.pending() > 0 {
                if !self.idle(&ctx).await {
                    return;
                }
                continue;
            }

            let entries = self.registry.snapshot_sorted(self.sort_type);
            if entries.is_empty() {
                continue;
            }
            self.counters.sweeps.fetch_add(1, Ordering::Relaxed);
            debug!(
                component = "autoload",
                event = "sweep",
                entries = entries.len(),
                "dispatching sweep"
            );

            let mut abandoned = false;
            for entry in entries {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        return;
                    }
                    sent = self.w_tasks_tx.send(entry) => {
                        if let Err(e) = sent {
                            warn!(
                                component = "autoload",
                                event = "dispatch_failed",
                                key = %e.0.full_key(),
                                "dispatch queue closed, sweep abandoned"
                            );
                            abandoned = true;
                            break;
                        }
                    }
                }
            }
            if abandoned && !self.idle(&ctx).await {
                return;
            }
        }
    }

    /// Sleeps one idle interval; false when cancelled meanwhile.
    async fn idle(&self, ctx: &CancellationToken) -> bool {
        tokio::select! {
            _ = ctx.cancelled() => false,
            _ = tokio::time::sleep(self.idle_interval) => true,
        }
    }
}

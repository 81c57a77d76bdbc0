// Package autoload provides the refresh workers.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::model::{AutoLoadEntry, CacheWrapper};
use crate::registry::AutoLoadRegistry;
use crate::time;
use crate::workers::{AutoLoadConfig, CacheStore};

use super::counters::Counters;
use super::decision::{decide, Decision, DemoteReason, SkipReason};

/// What one pass over an entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Demoted(DemoteReason),
    /// The store already held a newer value; its timestamp was taken over.
    Adopted,
    Loaded,
    Failed,
}

/// Applies the decision policy to dequeued entries and reloads the due ones.
pub struct Refresher {
    id: usize,
    cfg: Arc<AutoLoadConfig>,
    registry: Arc<AutoLoadRegistry>,
    store: Arc<dyn CacheStore>,
    counters: Arc<Counters>,
}

impl Refresher {
    pub fn new(
        id: usize,
        cfg: Arc<AutoLoadConfig>,
        registry: Arc<AutoLoadRegistry>,
        store: Arc<dyn CacheStore>,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            id,
            cfg,
            registry,
            store,
            counters,
        }
    }

    /// Dequeues until `ctx` is cancelled or the queue closes, pausing
    /// `auto_load_period` after every entry.
    pub async fn run(
        self,
        ctx: CancellationToken,
        w_tasks: Arc<Mutex<mpsc::Receiver<Arc<AutoLoadEntry>>>>,
        w_num_active: Arc<AtomicI64>,
    ) {
        let _guard = WorkerGuard::new(w_num_active, self.id);
        debug!(component = "autoload", event = "refresher_up", refresher = self.id, "refresher upped");

        loop {
            let entry = tokio::select! {
                _ = ctx.cancelled() => {
                    return;
                }
                entry = async {
                    let mut guard = w_tasks.lock().await;
                    guard.recv().await
                } => entry,
            };
            let Some(entry) = entry else {
                return;
            };

            self.process(&entry).await;

            tokio::select! {
                _ = ctx.cancelled() => {
                    return;
                }
                _ = tokio::time::sleep(self.cfg.auto_load_period) => {}
            }
        }
    }

    /// Runs the decision policy for `entry` and acts on it.
    ///
    /// Loader failures are logged and counted; the entry stays registered and
    /// is retried on a later sweep.
    pub async fn process(&self, entry: &Arc<AutoLoadEntry>) -> Outcome {
        let now = time::now_millis();
        let threshold_ms = match decide(entry, now) {
            Decision::Skip(reason) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                return Outcome::Skipped(reason);
            }
            Decision::Demote(reason) => {
                if self.registry.remove_entry(entry) {
                    self.counters.demoted.fetch_add(1, Ordering::Relaxed);
                    info!(
                        component = "autoload",
                        event = "demoted",
                        key = %entry.full_key(),
                        reason = ?reason,
                        load_cnt = entry.load_cnt(),
                        average_use_time = entry.average_use_time(),
                        "entry removed from background refresh"
                    );
                }
                return Outcome::Demoted(reason);
            }
            Decision::Refresh { threshold_ms } => threshold_ms,
        };

        let Some(guard) = entry.try_begin_load() else {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return Outcome::Skipped(SkipReason::Loading);
        };

        if self.cfg.check_from_cache_before_load {
            if let Some(stored) = self.store.get(entry.key()).await {
                // Wall-clock comparison across nodes; skewed clocks can cause
                // a duplicate or a skipped refresh.
                if stored.last_load_time > entry.last_load_time()
                    && now - stored.last_load_time < threshold_ms
                {
                    entry.set_last_load_time(stored.last_load_time);
                    self.counters.adopted.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        component = "autoload",
                        event = "adopted",
                        key = %entry.full_key(),
                        last_load_time = stored.last_load_time,
                        "value already refreshed elsewhere"
                    );
                    return Outcome::Adopted;
                }
            }
        }

        let started = Instant::now();
        let result = entry.invocation().proceed().await;
        let elapsed = started.elapsed();
        let use_time = elapsed.as_millis() as i64;

        match result {
            Ok(value) => {
                let loaded_at = time::now_millis();
                entry.record_load(&guard, use_time, loaded_at);
                drop(guard);

                let wrapper = CacheWrapper::new(value, entry.policy().expire, loaded_at);
                self.store.set(entry.key(), &wrapper).await;
                self.counters.loaded.fetch_add(1, Ordering::Relaxed);

                if self.cfg.print_slow_log && elapsed >= self.cfg.slow_load_time {
                    self.counters.slow.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        component = "autoload",
                        event = "slow_load",
                        key = %entry.full_key(),
                        method = entry.invocation().method(),
                        use_time_ms = use_time,
                        "background load was slow"
                    );
                }
                Outcome::Loaded
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                error!(
                    component = "autoload",
                    event = "load_failed",
                    key = %entry.full_key(),
                    method = entry.invocation().method(),
                    error = %e,
                    "background load failed"
                );
                Outcome::Failed
            }
        }
    }
}

/// Guard to decrement active refresher count on drop.
struct WorkerGuard {
    w_num_active: Arc<AtomicI64>,
    id: usize,
}

impl WorkerGuard {
    fn new(w_num_active: Arc<AtomicI64>, id: usize) -> Self {
        w_num_active.fetch_add(1, Ordering::Relaxed);
        Self { w_num_active, id }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.w_num_active.fetch_sub(1, Ordering::Relaxed);
        debug!(component = "autoload", event = "refresher_gone", refresher = self.id, "refresher is gone");
    }
}

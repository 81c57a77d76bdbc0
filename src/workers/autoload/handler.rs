// Package autoload wires the dispatcher, the refreshers and telemetry together.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::model::AutoLoadEntry;
use crate::registry::AutoLoadRegistry;
use crate::workers::{AutoLoadConfig, CacheStore};

use super::counters::Counters;
use super::dispatcher::Dispatcher;
use super::refresher::Refresher;
use super::telemetry;

/// Owns the background refresh machinery for one registry.
pub struct AutoLoadHandler {
    shutdown_token: CancellationToken,
    cfg: Arc<AutoLoadConfig>,
    registry: Arc<AutoLoadRegistry>,
    store: Arc<dyn CacheStore>,
    counters: Arc<Counters>,
    w_wg: Mutex<JoinSet<()>>,
    w_num_active: Arc<AtomicI64>,
    w_tasks: Arc<Mutex<mpsc::Receiver<Arc<AutoLoadEntry>>>>,
    w_tasks_tx: mpsc::Sender<Arc<AutoLoadEntry>>,
    inited: AtomicBool,
}

impl AutoLoadHandler {
    /// Creates a stopped handler; `shutdown_token` cancels it together with
    /// everything else derived from that token.
    pub fn new(
        shutdown_token: &CancellationToken,
        cfg: AutoLoadConfig,
        registry: Arc<AutoLoadRegistry>,
        store: Arc<dyn CacheStore>,
    ) -> Arc<Self> {
        let (w_tasks_tx, w_tasks_rx) = mpsc::channel(cfg.max_element.max(1));
        Arc::new(Self {
            shutdown_token: shutdown_token.child_token(),
            cfg: Arc::new(cfg),
            registry,
            store,
            counters: Arc::new(Counters::new()),
            w_wg: Mutex::new(JoinSet::new()),
            w_num_active: Arc::new(AtomicI64::new(0)),
            w_tasks: Arc::new(Mutex::new(w_tasks_rx)),
            w_tasks_tx,
            inited: AtomicBool::new(false),
        })
    }

    /// Spawns the dispatcher, `thread_cnt` refreshers and the telemetry logger.
    /// Later calls are no-ops.
    pub async fn start(&self) {
        if self
            .inited
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let mut join_set = self.w_wg.lock().await;

        let dispatcher = Dispatcher::new(
            self.registry.clone(),
            self.w_tasks_tx.clone(),
            self.cfg.sort_type,
            self.cfg.idle_interval,
            self.counters.clone(),
        );
        join_set.spawn(dispatcher.run(self.shutdown_token.clone()));

        for id in 0..self.cfg.thread_cnt {
            let refresher = Refresher::new(
                id,
                self.cfg.clone(),
                self.registry.clone(),
                self.store.clone(),
                self.counters.clone(),
            );
            join_set.spawn(refresher.run(
                self.shutdown_token.clone(),
                self.w_tasks.clone(),
                self.w_num_active.clone(),
            ));
        }

        join_set.spawn(telemetry::logger(
            self.shutdown_token.clone(),
            self.counters.clone(),
            self.registry.clone(),
            self.w_num_active.clone(),
            self.cfg.telemetry_interval,
        ));

        info!(
            component = "autoload",
            event = "started",
            refreshers = self.cfg.thread_cnt,
            max_element = self.cfg.max_element,
            sort_type = ?self.cfg.sort_type,
            "autoload handler started"
        );
    }

    pub fn config(&self) -> &AutoLoadConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &Arc<AutoLoadRegistry> {
        &self.registry
    }

    pub fn size(&self) -> usize {
        self.registry.size()
    }

    /// Live refresher tasks.
    pub fn refreshers(&self) -> i64 {
        self.w_num_active.load(Ordering::Relaxed)
    }

    /// Entries dispatched but not yet picked up.
    pub fn queued(&self) -> usize {
        self.w_tasks_tx.max_capacity() - self.w_tasks_tx.capacity()
    }

    /// Registered entries in the configured order, for monitoring. Empty when
    /// nothing is registered.
    pub fn auto_load_queue(&self) -> Vec<Arc<AutoLoadEntry>> {
        self.registry.snapshot_sorted(self.cfg.sort_type)
    }

    /// Stops every task, waits for them and releases the registry. In-flight
    /// loads run to completion first.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        {
            let mut wg = self.w_wg.lock().await;
            while wg.join_next().await.is_some() {}
        }
        self.registry.shutdown();
        info!(component = "autoload", event = "closed", "autoload handler closed");
    }
}

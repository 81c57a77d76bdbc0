// Package workers provides worker configuration.

use std::time::Duration;

use crate::config::Autoload;
use crate::registry::SortType;

/// Runtime settings of the autoload worker group.
#[derive(Debug, Clone)]
pub struct AutoLoadConfig {
    /// Number of refresher tasks.
    pub thread_cnt: usize,
    /// Registry capacity; also the dispatch queue bound.
    pub max_element: usize,
    /// Pause of one refresher after each processed entry.
    pub auto_load_period: Duration,
    /// Dispatcher back-off while the registry is empty or a sweep is in flight.
    pub idle_interval: Duration,
    pub sort_type: SortType,
    /// Read the stored envelope before loading to skip entries another node refreshed.
    pub check_from_cache_before_load: bool,
    pub print_slow_log: bool,
    pub slow_load_time: Duration,
    pub telemetry_interval: Duration,
}

impl Default for AutoLoadConfig {
    fn default() -> Self {
        Self::from(&Autoload::default())
    }
}

impl From<&Autoload> for AutoLoadConfig {
    fn from(cfg: &Autoload) -> Self {
        Self {
            thread_cnt: cfg.thread_cnt.max(1),
            max_element: cfg.max_element.max(1),
            auto_load_period: cfg.auto_load_period,
            idle_interval: cfg.idle_interval,
            sort_type: cfg.sort_type,
            check_from_cache_before_load: cfg.check_from_cache_before_load,
            print_slow_log: cfg.print_slow_log,
            slow_load_time: cfg.slow_load_time,
            telemetry_interval: cfg.telemetry_interval,
        }
    }
}

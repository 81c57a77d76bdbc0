// Metric name constants
pub const AUTOLOAD_LOADED: &str = "autoload_loaded";
pub const AUTOLOAD_ERRORS: &str = "autoload_errors";
pub const AUTOLOAD_SLOW: &str = "autoload_slow";
pub const AUTOLOAD_ADOPTED: &str = "autoload_adopted";
pub const AUTOLOAD_SKIPPED: &str = "autoload_skipped";
pub const AUTOLOAD_DEMOTED: &str = "autoload_demoted";
pub const AUTOLOAD_SWEEPS: &str = "autoload_sweeps";
pub const AUTOLOAD_REGISTRY_SIZE: &str = "autoload_registry_size";
pub const AUTOLOAD_REFRESHERS: &str = "autoload_refreshers";

/// Per-interval refresh statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoLoadStats {
    pub loaded: i64,
    pub errors: i64,
    pub slow: i64,
    pub adopted: i64,
    pub skipped: i64,
    pub demoted: i64,
    pub sweeps: i64,
}

/// Adds one interval of refresh statistics.
pub fn add_autoload_stat_counters(stats: &AutoLoadStats) {
    metrics::counter!(AUTOLOAD_LOADED).increment(stats.loaded.max(0) as u64);
    metrics::counter!(AUTOLOAD_ERRORS).increment(stats.errors.max(0) as u64);
    metrics::counter!(AUTOLOAD_SLOW).increment(stats.slow.max(0) as u64);
    metrics::counter!(AUTOLOAD_ADOPTED).increment(stats.adopted.max(0) as u64);
    metrics::counter!(AUTOLOAD_SKIPPED).increment(stats.skipped.max(0) as u64);
    metrics::counter!(AUTOLOAD_DEMOTED).increment(stats.demoted.max(0) as u64);
    metrics::counter!(AUTOLOAD_SWEEPS).increment(stats.sweeps.max(0) as u64);
}

/// Sets the number of registered autoload entries.
pub fn set_registry_size(len: usize) {
    metrics::gauge!(AUTOLOAD_REGISTRY_SIZE).set(len as f64);
}

/// Sets the number of live refresher tasks.
pub fn set_refreshers(n: i64) {
    metrics::gauge!(AUTOLOAD_REFRESHERS).set(n as f64);
}

// Package autoload provides counters for the refresh workers.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::metrics::AutoLoadStats;

/// Counters for refresh operations, drained by the telemetry logger.
pub struct Counters {
    /// Successful background loads.
    pub loaded: AtomicI64,
    /// Loads whose loader failed.
    pub errors: AtomicI64,
    /// Loads slower than the configured slow-load time.
    pub slow: AtomicI64,
    /// Entries that adopted a newer timestamp from the store instead of loading.
    pub adopted: AtomicI64,
    /// Entries skipped by the decision policy.
    pub skipped: AtomicI64,
    /// Entries removed from the registry by the decision policy.
    pub demoted: AtomicI64,
    /// Dispatch sweeps started.
    pub sweeps: AtomicI64,
}

impl Counters {
    /// Creates new counters.
    pub fn new() -> Self {
        Self {
            loaded: AtomicI64::new(0),
            errors: AtomicI64::new(0),
            slow: AtomicI64::new(0),
            adopted: AtomicI64::new(0),
            skipped: AtomicI64::new(0),
            demoted: AtomicI64::new(0),
            sweeps: AtomicI64::new(0),
        }
    }

    /// Resets all counters and returns their previous values.
    pub fn reset(&self) -> AutoLoadStats {
        AutoLoadStats {
            loaded: self.loaded.swap(0, Ordering::Relaxed),
            errors: self.errors.swap(0, Ordering::Relaxed),
            slow: self.slow.swap(0, Ordering::Relaxed),
            adopted: self.adopted.swap(0, Ordering::Relaxed),
            skipped: self.skipped.swap(0, Ordering::Relaxed),
            demoted: self.demoted.swap(0, Ordering::Relaxed),
            sweeps: self.sweeps.swap(0, Ordering::Relaxed),
        }
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

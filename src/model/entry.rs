//! Background refresh jobs.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use super::{CacheKey, CachePolicy, Invocation};

/// `last_load_time` value that makes any entry look overdue.
pub const LOAD_TIME_SENTINEL: i64 = 1;

/// One registered autoload job.
///
/// Request bookkeeping is written by the foreground path. Load statistics
/// (`load_cnt`, `use_total_time`, `last_load_time` after a load) are written
/// only by whoever holds the [`LoadGuard`], so they never race each other.
pub struct AutoLoadEntry {
    key: CacheKey,
    full_key: String,
    invocation: Invocation,
    policy: CachePolicy,
    first_request_time: AtomicI64,
    last_request_time: AtomicI64,
    last_load_time: AtomicI64,
    load_cnt: AtomicI64,
    use_total_time: AtomicI64,
    request_times: AtomicI64,
    loading: AtomicBool,
}

impl AutoLoadEntry {
    /// Creates an entry around an already snapshotted invocation.
    pub fn new(key: CacheKey, invocation: Invocation, policy: CachePolicy) -> Self {
        let full_key = key.full_key();
        Self {
            key,
            full_key,
            invocation,
            policy,
            first_request_time: AtomicI64::new(0),
            last_request_time: AtomicI64::new(0),
            last_load_time: AtomicI64::new(0),
            load_cnt: AtomicI64::new(0),
            use_total_time: AtomicI64::new(0),
            request_times: AtomicI64::new(0),
            loading: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn full_key(&self) -> &str {
        &self.full_key
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn first_request_time(&self) -> i64 {
        self.first_request_time.load(Ordering::Relaxed)
    }

    pub fn last_request_time(&self) -> i64 {
        self.last_request_time.load(Ordering::Relaxed)
    }

    pub fn last_load_time(&self) -> i64 {
        self.last_load_time.load(Ordering::Acquire)
    }

    pub fn load_cnt(&self) -> i64 {
        self.load_cnt.load(Ordering::Relaxed)
    }

    pub fn request_times(&self) -> i64 {
        self.request_times.load(Ordering::Relaxed)
    }

    /// Running average of load latency in milliseconds.
    pub fn average_use_time(&self) -> i64 {
        let cnt = self.load_cnt();
        if cnt <= 0 {
            return 0;
        }
        self.use_total_time.load(Ordering::Relaxed) / cnt
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Records a foreground access.
    pub fn touch_request(&self, now_millis: i64) {
        let _ = self.first_request_time.compare_exchange(
            0,
            now_millis,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        self.last_request_time.store(now_millis, Ordering::Relaxed);
        self.request_times.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed load. Callers must hold the load guard.
    pub fn record_load(&self, _guard: &LoadGuard<'_>, use_time_millis: i64, loaded_at: i64) {
        self.load_cnt.fetch_add(1, Ordering::Relaxed);
        self.use_total_time
            .fetch_add(use_time_millis.max(0), Ordering::Relaxed);
        self.last_load_time.store(loaded_at, Ordering::Release);
    }

    /// Overwrites the load timestamp (reset after invalidation, or adoption of
    /// a value another node already refreshed).
    pub fn set_last_load_time(&self, millis: i64) {
        self.last_load_time.store(millis, Ordering::Release);
    }

    /// Claims the exclusive right to refresh this entry.
    pub fn try_begin_load(&self) -> Option<LoadGuard<'_>> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadGuard { entry: self })
    }
}

impl std::fmt::Debug for AutoLoadEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoLoadEntry")
            .field("key", &self.full_key)
            .field("expire", &self.policy.expire)
            .field("first_request_time", &self.first_request_time())
            .field("last_request_time", &self.last_request_time())
            .field("last_load_time", &self.last_load_time())
            .field("load_cnt", &self.load_cnt())
            .field("average_use_time", &self.average_use_time())
            .field("request_times", &self.request_times())
            .field("loading", &self.is_loading())
            .finish()
    }
}

/// Holds an entry's `loading` flag; released on drop, whatever the load outcome.
pub struct LoadGuard<'a> {
    entry: &'a AutoLoadEntry,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.entry.loading.store(false, Ordering::Release);
    }
}

//! Per-call caching policy supplied by the interception layer.

/// Minimum TTL (seconds) for a call to qualify for background refresh.
pub const MIN_AUTOLOAD_EXPIRE: u64 = 120;

/// Read-only policy attached to a cacheable call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// TTL in seconds; 0 means no expiry.
    pub expire: u64,
    /// Seconds without a foreground request after which background refresh stops; 0 disables.
    pub request_timeout: u64,
    /// Whether the call asked for background refresh at all.
    pub auto_load: bool,
}

impl CachePolicy {
    pub fn new(expire: u64) -> Self {
        Self {
            expire,
            request_timeout: 0,
            auto_load: true,
        }
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = secs;
        self
    }

    pub fn with_auto_load(mut self, enabled: bool) -> Self {
        self.auto_load = enabled;
        self
    }

    /// Background refresh was requested and the TTL is at least two minutes.
    pub fn qualifies_for_autoload(&self) -> bool {
        self.auto_load && self.expire >= MIN_AUTOLOAD_EXPIRE
    }
}

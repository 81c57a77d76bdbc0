//! Envelope stored in the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cached value plus the metadata needed for refresh coordination.
///
/// `last_load_time` is the epoch-millis timestamp of the write that produced
/// `value`. Writers always stamp it from the shared clock, so a reader never
/// sees it go backwards for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheWrapper {
    pub value: Value,
    pub last_load_time: i64,
    pub expire: u64,
}

impl CacheWrapper {
    pub fn new(value: Value, expire: u64, last_load_time: i64) -> Self {
        Self {
            value,
            last_load_time,
            expire,
        }
    }

    /// Checks the envelope against its own TTL.
    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.expire > 0 && now_millis - self.last_load_time >= (self.expire as i64) * 1000
    }
}

// Package workers exposes the store interface used by the refresh workers.

use crate::model::{CacheKey, CacheWrapper};

/// Cache operations the refreshers and the foreground manager depend on.
///
/// Implementations absorb backend failures: a failed read is a miss and a
/// failed write or delete is dropped.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads the stored envelope for `key`.
    async fn get(&self, key: &CacheKey) -> Option<CacheWrapper>;

    /// Writes `wrapper` under `key` with the wrapper's TTL.
    async fn set(&self, key: &CacheKey, wrapper: &CacheWrapper);

    /// Deletes `key`, a wildcard pattern, or everything for `*`.
    async fn delete(&self, key: &CacheKey);
}

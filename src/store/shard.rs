//! One partition of the backend keyspace.

use super::StoreError;

/// Commands the driver needs from a shard. Implementations acquire a pooled
/// connection per call and release it before returning.
#[async_trait::async_trait]
pub trait ShardConnection: Send + Sync {
    /// Stable shard identifier; script identifiers are cached under it.
    fn id(&self) -> &str;

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// SET when `ttl_secs` is 0, SETEX otherwise.
    async fn set(&self, key: &[u8], value: &[u8], ttl_secs: u64) -> Result<(), StoreError>;

    async fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    async fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// HSET followed by EXPIRE on the whole key, sent as one pipeline.
    /// Not atomic: the field may be visible before the TTL lands.
    async fn hset_expire_pipelined(
        &self,
        key: &[u8],
        field: &[u8],
        value: &[u8],
        ttl_secs: u64,
    ) -> Result<(), StoreError>;

    async fn hdel(&self, key: &[u8], field: &[u8]) -> Result<(), StoreError>;

    async fn del(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Drops the shard's whole keyspace.
    async fn flush_db(&self) -> Result<(), StoreError>;

    /// Uploads a script body and returns its server-side identifier.
    async fn script_load(&self, body: &str) -> Result<String, StoreError>;

    /// Runs a loaded script. Fails with [`StoreError::NoScript`] when the
    /// identifier is unknown. A nil reply maps to an empty list.
    async fn eval_sha(
        &self,
        sha: &str,
        keys: &[&[u8]],
        args: &[&[u8]],
    ) -> Result<Vec<String>, StoreError>;
}

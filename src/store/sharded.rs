//! Cache-level operations over the sharded backend.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{CacheKey, CacheWrapper, Codec};
use crate::registry::AutoLoadRegistry;
use crate::workers::CacheStore;

use super::{ScriptCache, ShardConnection, ShardRouter, DELETE_BY_PATTERN, HASH_SET_EXPIRE};

/// Write behaviour for hash-field keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// TTL in seconds applied to the whole hash key; negative means the wrapper's own TTL.
    #[serde(default = "default_hash_expire")]
    pub hash_expire: i64,
    /// Write field and TTL through one server-side script instead of a pipeline.
    #[serde(default)]
    pub hash_expire_by_script: bool,
}

fn default_hash_expire() -> i64 {
    -1
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            hash_expire: default_hash_expire(),
            hash_expire_by_script: false,
        }
    }
}

impl StoreOptions {
    /// TTL actually applied to a hash key holding `wrapper`.
    pub fn effective_hash_ttl(&self, wrapper: &CacheWrapper) -> u64 {
        if self.hash_expire >= 0 {
            self.hash_expire as u64
        } else {
            wrapper.expire
        }
    }
}

/// Routes cache operations to shards by the key's base component.
///
/// No operation fails towards the caller: backend and codec errors are
/// logged and surface as a miss or a dropped write.
pub struct ShardedStore {
    router: ShardRouter,
    codec: Arc<dyn Codec>,
    options: StoreOptions,
    hash_set_script: ScriptCache,
    delete_script: ScriptCache,
    registry: RwLock<Option<Arc<AutoLoadRegistry>>>,
}

impl ShardedStore {
    pub fn new(
        shards: Vec<Arc<dyn ShardConnection>>,
        codec: Arc<dyn Codec>,
        options: StoreOptions,
    ) -> Self {
        Self {
            router: ShardRouter::new(shards),
            codec,
            options,
            hash_set_script: ScriptCache::new(HASH_SET_EXPIRE),
            delete_script: ScriptCache::new(DELETE_BY_PATTERN),
            registry: RwLock::new(None),
        }
    }

    /// Registry notified when keys are invalidated.
    pub fn attach_registry(&self, registry: Arc<AutoLoadRegistry>) {
        *self.registry.write() = Some(registry);
    }

    pub fn shard_count(&self) -> usize {
        self.router.len()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheWrapper> {
        let conn = self.route(key)?;
        let raw = match key.hfield() {
            Some(field) => conn.hget(key.key().as_bytes(), field.as_bytes()).await,
            None => conn.get(key.key().as_bytes()).await,
        };
        let bytes = match raw {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    component = "store",
                    event = "get_failed",
                    key = %key,
                    shard = conn.id(),
                    error = %e,
                    "treating backend failure as a miss"
                );
                return None;
            }
        };
        match self.codec.decode(&bytes) {
            Ok(wrapper) => Some(wrapper),
            Err(e) => {
                warn!(
                    component = "store",
                    event = "decode_failed",
                    key = %key,
                    error = %e,
                    "treating undecodable value as a miss"
                );
                None
            }
        }
    }

    /// Plain write with the wrapper's TTL; keys with a field go through [`Self::hash_field_set`].
    pub async fn set(&self, key: &CacheKey, wrapper: &CacheWrapper) {
        if key.hfield().is_some() {
            self.hash_field_set(key, wrapper, self.options.hash_expire_by_script)
                .await;
            return;
        }
        self.write_plain(key, wrapper, wrapper.expire).await;
    }

    /// Writes a hash field and applies the effective TTL to the whole hash key.
    ///
    /// With `atomic` both happen in one script execution, so no reader sees the
    /// field without the TTL. Otherwise they are pipelined and a short window
    /// exists where the field is visible before the TTL lands.
    pub async fn hash_field_set(&self, key: &CacheKey, wrapper: &CacheWrapper, atomic: bool) {
        let Some(field) = key.hfield() else {
            let ttl = self.options.effective_hash_ttl(wrapper);
            self.write_plain(key, wrapper, ttl).await;
            return;
        };
        let Some(conn) = self.route(key) else {
            return;
        };
        let Some(bytes) = self.encode(key, wrapper) else {
            return;
        };
        let ttl = self.options.effective_hash_ttl(wrapper);
        let hash_key = key.key().as_bytes();

        if ttl == 0 {
            if let Err(e) = conn.hset(hash_key, field.as_bytes(), &bytes).await {
                warn!(
                    component = "store",
                    event = "hset_failed",
                    key = %key,
                    shard = conn.id(),
                    error = %e,
                    "write dropped"
                );
            }
            return;
        }

        if atomic {
            let ttl_arg = ttl.to_string();
            // Failures are already logged by the script cache.
            let _ = self
                .hash_set_script
                .eval(
                    conn.as_ref(),
                    &[hash_key, field.as_bytes()],
                    &[bytes.as_slice(), ttl_arg.as_bytes()],
                )
                .await;
        } else if let Err(e) = conn
            .hset_expire_pipelined(hash_key, field.as_bytes(), &bytes, ttl)
            .await
        {
            warn!(
                component = "store",
                event = "hset_pipeline_failed",
                key = %key,
                shard = conn.id(),
                error = %e,
                "write dropped"
            );
        }
    }

    async fn write_plain(&self, key: &CacheKey, wrapper: &CacheWrapper, ttl: u64) {
        let Some(conn) = self.route(key) else {
            return;
        };
        let Some(bytes) = self.encode(key, wrapper) else {
            return;
        };
        if let Err(e) = conn.set(key.key().as_bytes(), &bytes, ttl).await {
            warn!(
                component = "store",
                event = "set_failed",
                key = %key,
                shard = conn.id(),
                error = %e,
                "write dropped"
            );
        }
    }

    /// Deletes by key literal.
    ///
    /// `*` flushes every shard, a wildcard pattern runs the delete script on
    /// every shard, and an exact key (or field) is deleted on its own shard
    /// and then has its refresh timer reset.
    pub async fn delete(&self, key: &CacheKey) {
        if key.is_flush_all() {
            self.flush_all().await;
        } else if key.is_pattern() {
            self.delete_pattern(key).await;
        } else {
            self.delete_exact(key).await;
        }
    }

    async fn flush_all(&self) {
        for conn in self.router.all() {
            match conn.flush_db().await {
                Ok(()) => debug!(
                    component = "store",
                    event = "flushed",
                    shard = conn.id(),
                    "shard keyspace cleared"
                ),
                Err(e) => warn!(
                    component = "store",
                    event = "flush_failed",
                    shard = conn.id(),
                    error = %e,
                    "flush dropped"
                ),
            }
        }
    }

    async fn delete_pattern(&self, key: &CacheKey) {
        let pattern = key.key().as_bytes();
        let mut deleted = Vec::new();
        for conn in self.router.all() {
            if let Some(keys) = self.delete_script.eval(conn.as_ref(), &[pattern], &[]).await {
                deleted.extend(keys);
            }
        }
        debug!(
            component = "store",
            event = "pattern_deleted",
            pattern = %key,
            deleted = deleted.len(),
            "wildcard delete finished"
        );
        if let Some(registry) = self.registry() {
            for k in &deleted {
                registry.reset_last_load_under(k);
            }
        }
    }

    async fn delete_exact(&self, key: &CacheKey) {
        let Some(conn) = self.route(key) else {
            return;
        };
        let result = match key.hfield() {
            Some(field) => conn.hdel(key.key().as_bytes(), field.as_bytes()).await,
            None => conn.del(key.key().as_bytes()).await,
        };
        match result {
            Ok(()) => {
                if let Some(registry) = self.registry() {
                    registry.reset_last_load(key);
                }
            }
            Err(e) => warn!(
                component = "store",
                event = "delete_failed",
                key = %key,
                shard = conn.id(),
                error = %e,
                "delete dropped"
            ),
        }
    }

    fn route(&self, key: &CacheKey) -> Option<&Arc<dyn ShardConnection>> {
        let conn = self.router.route(key.key());
        if conn.is_none() {
            warn!(component = "store", event = "no_shard", key = %key, "no shard configured");
        }
        conn
    }

    fn encode(&self, key: &CacheKey, wrapper: &CacheWrapper) -> Option<Vec<u8>> {
        match self.codec.encode(wrapper) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(
                    component = "store",
                    event = "encode_failed",
                    key = %key,
                    error = %e,
                    "write dropped"
                );
                None
            }
        }
    }

    fn registry(&self) -> Option<Arc<AutoLoadRegistry>> {
        self.registry.read().clone()
    }
}

#[async_trait::async_trait]
impl CacheStore for ShardedStore {
    async fn get(&self, key: &CacheKey) -> Option<CacheWrapper> {
        ShardedStore::get(self, key).await
    }

    async fn set(&self, key: &CacheKey, wrapper: &CacheWrapper) {
        ShardedStore::set(self, key, wrapper).await
    }

    async fn delete(&self, key: &CacheKey) {
        ShardedStore::delete(self, key).await
    }
}

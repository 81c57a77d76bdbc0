// Package manager serves cacheable calls from the store and keeps the
// autoload registry informed about them.

use std::sync::Arc;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::model::{AutoLoadEntry, CacheKey, CachePolicy, CacheWrapper, Invocation};
use crate::registry::AutoLoadRegistry;
use crate::time;
use crate::workers::CacheStore;

pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    registry: Arc<AutoLoadRegistry>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>, registry: Arc<AutoLoadRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &Arc<AutoLoadRegistry> {
        &self.registry
    }

    /// Serves one cacheable call.
    ///
    /// A hit touches (and if needed registers) the autoload entry. A miss runs
    /// the loader, writes the result and records the load on the entry. Store
    /// failures only cost a recomputation; loader errors go back to the caller.
    pub async fn proceed(
        &self,
        key: &CacheKey,
        invocation: &Invocation,
        policy: CachePolicy,
    ) -> anyhow::Result<Value> {
        let now = time::now_millis();
        if let Some(wrapper) = self.store.get(key).await {
            if !wrapper.is_expired(now) {
                if let Some(entry) = self.entry(key, invocation, policy) {
                    if entry.last_load_time() <= 0 {
                        entry.set_last_load_time(wrapper.last_load_time);
                    }
                }
                debug!(component = "manager", event = "hit", key = %key, "served from cache");
                return Ok(wrapper.value);
            }
        }

        let started = Instant::now();
        let value = invocation.proceed().await?;
        let use_time = started.elapsed().as_millis() as i64;
        let loaded_at = time::now_millis();

        let wrapper = CacheWrapper::new(value, policy.expire, loaded_at);
        self.store.set(key, &wrapper).await;

        if let Some(entry) = self.entry(key, invocation, policy) {
            if let Some(guard) = entry.try_begin_load() {
                entry.record_load(&guard, use_time, loaded_at);
            }
        }
        debug!(
            component = "manager",
            event = "miss",
            key = %key,
            use_time_ms = use_time,
            "loaded and cached"
        );
        Ok(wrapper.value)
    }

    /// Deletes `key`, a wildcard pattern, or everything for `*`.
    pub async fn delete(&self, key: &CacheKey) {
        self.store.delete(key).await;
    }

    /// Touched registry entry for `key`, registering it when the policy qualifies.
    fn entry(
        &self,
        key: &CacheKey,
        invocation: &Invocation,
        policy: CachePolicy,
    ) -> Option<Arc<AutoLoadEntry>> {
        let entry = match self.registry.get(key) {
            Some(entry) => entry,
            None => self.registry.register_if_absent(key, invocation, policy)?,
        };
        entry.touch_request(time::now_millis());
        Some(entry)
    }
}

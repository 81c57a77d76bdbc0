#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::manager::CacheManager;
    use crate::model::{CacheKey, CachePolicy, CacheWrapper, JsonCodec};
    use crate::registry::AutoLoadRegistry;
    use crate::store::memory::MemoryShard;
    use crate::store::{ShardedStore, StoreOptions};
    use crate::support::fixtures::memory_store;
    use crate::support::loader::CountingLoader;
    use crate::time;
    use crate::workers::CacheStore;

    fn manager() -> (CacheManager, Arc<ShardedStore>, Arc<MemoryShard>) {
        let registry = Arc::new(AutoLoadRegistry::new(16, Arc::new(JsonCodec)));
        let (store, shard) = memory_store(StoreOptions::default());
        store.attach_registry(registry.clone());
        let manager = CacheManager::new(store.clone() as Arc<dyn CacheStore>, registry);
        (manager, store, shard)
    }

    #[tokio::test]
    async fn test_miss_loads_and_registers() {
        let (manager, store, _shard) = manager();
        let loader = CountingLoader::new();
        let invocation = loader.invocation("load_user", vec![json!(1)]);
        let key = CacheKey::new("user:1");

        let value = manager.proceed(&key, &invocation, CachePolicy::new(300)).await.unwrap();

        assert_eq!(value["call"], json!(1));
        assert_eq!(loader.calls(), 1);
        assert_eq!(store.get(&key).await.map(|w| w.value), Some(value));
        let entry = manager.registry().get(&key).unwrap();
        assert_eq!(entry.load_cnt(), 1);
        assert_eq!(entry.request_times(), 1);
        assert!(entry.last_load_time() > 1);
    }

    #[tokio::test]
    async fn test_hit_skips_loader_and_touches_entry() {
        let (manager, _store, _shard) = manager();
        let loader = CountingLoader::new();
        let invocation = loader.invocation("load_user", vec![json!(1)]);
        let key = CacheKey::new("user:1");

        let first = manager.proceed(&key, &invocation, CachePolicy::new(300)).await.unwrap();
        let second = manager.proceed(&key, &invocation, CachePolicy::new(300)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(loader.calls(), 1);
        assert_eq!(manager.registry().get(&key).unwrap().request_times(), 2);
    }

    #[tokio::test]
    async fn test_short_ttl_is_cached_but_not_registered() {
        let (manager, store, _shard) = manager();
        let loader = CountingLoader::new();
        let key = CacheKey::new("user:1");

        manager
            .proceed(&key, &loader.invocation("load_user", vec![]), CachePolicy::new(60))
            .await
            .unwrap();

        assert!(store.get(&key).await.is_some());
        assert!(manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_hit_registers_missing_entry() {
        let (manager, store, _shard) = manager();
        let loader = CountingLoader::new();
        let key = CacheKey::new("user:1");
        let loaded_at = time::now_millis() - 5_000;
        store
            .set(&key, &CacheWrapper::new(json!("cached"), 300, loaded_at))
            .await;

        let value = manager
            .proceed(&key, &loader.invocation("load_user", vec![]), CachePolicy::new(300))
            .await
            .unwrap();

        assert_eq!(value, json!("cached"));
        assert_eq!(loader.calls(), 0);
        let entry = manager.registry().get(&key).unwrap();
        assert_eq!(entry.last_load_time(), loaded_at);
        assert_eq!(entry.request_times(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_recomputes() {
        let (manager, _store, shard) = manager();
        shard.set_offline(true);
        let loader = CountingLoader::new();
        let invocation = loader.invocation("load_user", vec![]);
        let key = CacheKey::new("user:1");

        manager.proceed(&key, &invocation, CachePolicy::new(300)).await.unwrap();
        manager.proceed(&key, &invocation, CachePolicy::new(300)).await.unwrap();

        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn test_loader_error_reaches_caller() {
        let (manager, store, _shard) = manager();
        let loader = CountingLoader::failing();
        let key = CacheKey::new("user:1");

        let result = manager
            .proceed(&key, &loader.invocation("load_user", vec![]), CachePolicy::new(300))
            .await;

        assert!(result.is_err());
        assert!(store.get(&key).await.is_none());
        assert!(manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_delete_forces_reload() {
        let (manager, _store, _shard) = manager();
        let loader = CountingLoader::new();
        let invocation = loader.invocation("load_user", vec![]);
        let key = CacheKey::new("user:1");
        manager.proceed(&key, &invocation, CachePolicy::new(300)).await.unwrap();

        manager.delete(&key).await;
        assert_eq!(manager.registry().get(&key).unwrap().last_load_time(), 1);

        manager.proceed(&key, &invocation, CachePolicy::new(300)).await.unwrap();
        assert_eq!(loader.calls(), 2);
        assert!(manager.registry().get(&key).unwrap().last_load_time() > 1);
    }
}

use std::sync::Arc;

use serde_json::json;

use crate::model::{CacheKey, CachePolicy, JsonCodec};
use crate::registry::AutoLoadRegistry;
use crate::store::memory::MemoryShard;
use crate::store::{ShardConnection, ShardedStore, StoreOptions};

use super::loader::CountingLoader;

/// Registers `key` with `expire` and returns the loader behind it.
pub fn register(
    registry: &AutoLoadRegistry,
    key: &str,
    expire: u64,
) -> Arc<CountingLoader> {
    let loader = CountingLoader::new();
    let invocation = loader.invocation("load", vec![json!(key)]);
    registry
        .register_if_absent(&CacheKey::new(key), &invocation, CachePolicy::new(expire))
        .expect("registration must succeed");
    loader
}

/// Single-shard store over an in-memory backend.
pub fn memory_store(options: StoreOptions) -> (Arc<ShardedStore>, Arc<MemoryShard>) {
    let shard = Arc::new(MemoryShard::new("mem-0"));
    let store = ShardedStore::new(
        vec![shard.clone() as Arc<dyn ShardConnection>],
        Arc::new(JsonCodec),
        options,
    );
    (Arc::new(store), shard)
}

//! Routing of keys to shards.

use std::sync::Arc;

use xxhash_rust::xxh3::xxh3_64;

use super::ShardConnection;

/// Maps a routing key to one shard with a stable hash.
pub struct ShardRouter {
    shards: Vec<Arc<dyn ShardConnection>>,
}

impl ShardRouter {
    pub fn new(shards: Vec<Arc<dyn ShardConnection>>) -> Self {
        Self { shards }
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Shard owning `routing_key`; `None` only when no shard is configured.
    pub fn route(&self, routing_key: &str) -> Option<&Arc<dyn ShardConnection>> {
        if self.shards.is_empty() {
            return None;
        }
        let idx = (xxh3_64(routing_key.as_bytes()) % self.shards.len() as u64) as usize;
        self.shards.get(idx)
    }

    pub fn all(&self) -> &[Arc<dyn ShardConnection>] {
        &self.shards
    }
}

//! Sharded key-value store driver with scripted atomic operations.

pub mod error;
pub mod memory;
pub mod redis_shard;
pub mod router;
pub mod script;
pub mod shard;
pub mod sharded;

#[cfg(test)]
mod router_test;
#[cfg(test)]
mod script_test;

// Re-export main types
pub use error::StoreError;
pub use redis_shard::RedisShard;
pub use router::ShardRouter;
pub use script::{Script, ScriptCache, DELETE_BY_PATTERN, HASH_SET_EXPIRE};
pub use shard::ShardConnection;
pub use sharded::{ShardedStore, StoreOptions};

//! Redis-backed shard over a `deadpool-redis` connection pool.

use deadpool_redis::{Config as PoolConfig, Connection, Pool, PoolConfig as PoolSize, Runtime};

use super::{ShardConnection, StoreError};

/// One Redis instance (or logical database) of the sharded keyspace.
pub struct RedisShard {
    id: String,
    pool: Pool,
}

impl RedisShard {
    /// Builds a lazily-connecting pool for `url`.
    pub fn connect(id: impl Into<String>, url: &str, pool_size: usize) -> anyhow::Result<Self> {
        let mut cfg = PoolConfig::from_url(url);
        cfg.pool = Some(PoolSize::new(pool_size.max(1)));
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self {
            id: id.into(),
            pool,
        })
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait::async_trait]
impl ShardConnection for RedisShard {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        if ttl_secs == 0 {
            let _: () = redis::cmd("SET").arg(key).arg(value).query_async(&mut conn).await?;
        } else {
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(ttl_secs)
                .arg(value)
                .query_async(&mut conn)
                .await?;
        }
        Ok(())
    }

    async fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn hset_expire_pipelined(
        &self,
        key: &[u8],
        field: &[u8],
        value: &[u8],
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = redis::pipe()
            .cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn hdel(&self, key: &[u8], field: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("HDEL").arg(key).arg(field).query_async(&mut conn).await?;
        Ok(())
    }

    async fn del(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn flush_db(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn script_load(&self, body: &str) -> Result<String, StoreError> {
        let mut conn = self.conn().await?;
        let sha: String = redis::cmd("SCRIPT")
            .arg("LOAD")
            .arg(body)
            .query_async(&mut conn)
            .await?;
        Ok(sha)
    }

    async fn eval_sha(
        &self,
        sha: &str,
        keys: &[&[u8]],
        args: &[&[u8]],
    ) -> Result<Vec<String>, StoreError> {
        let mut cmd = redis::cmd("EVALSHA");
        cmd.arg(sha).arg(keys.len());
        for key in keys {
            cmd.arg(*key);
        }
        for arg in args {
            cmd.arg(*arg);
        }
        let mut conn = self.conn().await?;
        let reply: Option<Vec<String>> = cmd.query_async(&mut conn).await?;
        Ok(reply.unwrap_or_default())
    }
}

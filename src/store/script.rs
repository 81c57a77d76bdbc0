// Package script caches server-side script identifiers per shard.

use dashmap::DashMap;
use tracing::{error, warn};

use super::{ShardConnection, StoreError};

/// A server-side script with a fixed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Script {
    pub name: &'static str,
    pub body: &'static str,
}

/// KEYS[1] = hash key, KEYS[2] = field, ARGV[1] = value, ARGV[2] = TTL seconds.
pub const HASH_SET_EXPIRE: Script = Script {
    name: "hash_set_expire",
    body: "redis.call('HSET', KEYS[1], KEYS[2], ARGV[1])\n\
           redis.call('EXPIRE', KEYS[1], tonumber(ARGV[2]))\n\
           return nil",
};

/// KEYS[1] = glob pattern. Returns the deleted keys, nil when nothing matched.
pub const DELETE_BY_PATTERN: Script = Script {
    name: "delete_by_pattern",
    body: "local keys = redis.call('KEYS', KEYS[1])\n\
           if (not keys) or (#keys == 0) then return nil end\n\
           for i = 1, #keys, 5000 do\n\
           redis.call('DEL', unpack(keys, i, math.min(i + 4999, #keys)))\n\
           end\n\
           return keys",
};

/// Shard id -> script identifier for one script body.
///
/// Entries are advisory: losing one only costs an extra SCRIPT LOAD.
pub struct ScriptCache {
    script: Script,
    shas: DashMap<String, String>,
}

impl ScriptCache {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            shas: DashMap::new(),
        }
    }

    /// Returns the cached identifier for `conn`, loading the script on first use.
    pub async fn ensure_loaded(&self, conn: &dyn ShardConnection) -> Result<String, StoreError> {
        if let Some(sha) = self.shas.get(conn.id()) {
            return Ok(sha.value().clone());
        }
        let sha = conn.script_load(self.script.body).await?;
        self.shas.insert(conn.id().to_string(), sha.clone());
        Ok(sha)
    }

    /// Forgets the identifier cached for `conn`.
    pub fn invalidate(&self, conn: &dyn ShardConnection) {
        self.shas.remove(conn.id());
    }

    /// Cached identifier for `conn`, if any.
    pub fn cached(&self, conn: &dyn ShardConnection) -> Option<String> {
        self.shas.get(conn.id()).map(|sha| sha.value().clone())
    }

    /// Executes the script on `conn`.
    ///
    /// An unknown-identifier failure invalidates the cached identifier and
    /// triggers exactly one reload and retry. Any other failure, or a second
    /// failure, is logged and reported as `None`.
    pub async fn eval(
        &self,
        conn: &dyn ShardConnection,
        keys: &[&[u8]],
        args: &[&[u8]],
    ) -> Option<Vec<String>> {
        let sha = match self.ensure_loaded(conn).await {
            Ok(sha) => sha,
            Err(e) => {
                self.log_failure(conn, "script_load_failed", &e);
                return None;
            }
        };

        match conn.eval_sha(&sha, keys, args).await {
            Ok(reply) => Some(reply),
            Err(e) if e.is_no_script() => {
                warn!(
                    component = "store",
                    event = "script_unknown",
                    script = self.script.name,
                    shard = conn.id(),
                    error = %e,
                    "script identifier rejected, reloading"
                );
                self.invalidate(conn);
                self.retry(conn, keys, args).await
            }
            Err(e) => {
                self.log_failure(conn, "script_eval_failed", &e);
                None
            }
        }
    }

    async fn retry(
        &self,
        conn: &dyn ShardConnection,
        keys: &[&[u8]],
        args: &[&[u8]],
    ) -> Option<Vec<String>> {
        let sha = match self.ensure_loaded(conn).await {
            Ok(sha) => sha,
            Err(e) => {
                self.log_failure(conn, "script_reload_failed", &e);
                return None;
            }
        };
        match conn.eval_sha(&sha, keys, args).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                if e.is_no_script() {
                    self.invalidate(conn);
                }
                self.log_failure(conn, "script_retry_failed", &e);
                None
            }
        }
    }

    fn log_failure(&self, conn: &dyn ShardConnection, event: &'static str, e: &StoreError) {
        error!(
            component = "store",
            event,
            script = self.script.name,
            shard = conn.id(),
            error = %e,
            "script execution dropped"
        );
    }
}

//! Backend failure kinds.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The server does not know the script identifier (never loaded, flushed, or restarted).
    #[error("unknown script identifier: {0}")]
    NoScript(String),
    #[error("connection pool: {0}")]
    Pool(String),
    #[error("backend: {0}")]
    Backend(String),
    #[error("wrong value type at key {0}")]
    WrongType(String),
}

impl StoreError {
    pub fn is_no_script(&self) -> bool {
        matches!(self, StoreError::NoScript(_))
    }
}

impl From<::redis::RedisError> for StoreError {
    fn from(e: ::redis::RedisError) -> Self {
        match e.kind() {
            ::redis::ErrorKind::NoScriptError => StoreError::NoScript(e.to_string()),
            ::redis::ErrorKind::TypeError => StoreError::WrongType(e.to_string()),
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

impl From<deadpool_redis::PoolError> for StoreError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        StoreError::Pool(e.to_string())
    }
}

//! Replayable method invocations.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{Codec, CodecError};

/// The underlying computation behind a cacheable call.
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    /// Re-executes `method` with `args` and returns a fresh value.
    async fn load(&self, method: &str, args: &[Value]) -> anyhow::Result<Value>;
}

/// A captured call: target, method name and arguments.
#[derive(Clone)]
pub struct Invocation {
    loader: Arc<dyn Loader>,
    method: String,
    args: Vec<Value>,
}

impl Invocation {
    pub fn new(loader: Arc<dyn Loader>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            loader,
            method: method.into(),
            args,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Captures the invocation for later replay. Arguments are deep-cloned
    /// through the codec so the snapshot never aliases caller-owned state;
    /// the loader itself is shared.
    pub fn snapshot(&self, codec: &dyn Codec) -> Result<Invocation, CodecError> {
        Ok(Self {
            loader: self.loader.clone(),
            method: self.method.clone(),
            args: codec.deep_clone(&self.args)?,
        })
    }

    /// Runs the captured call.
    pub async fn proceed(&self) -> anyhow::Result<Value> {
        self.loader.load(&self.method, &self.args).await
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method)
            .field("args", &self.args)
            .finish()
    }
}

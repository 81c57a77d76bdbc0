use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::model::{Invocation, Loader};

/// Loader that counts calls and can be switched into a failing mode.
pub struct CountingLoader {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
}

impl CountingLoader {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
        })
    }

    pub fn failing() -> Arc<Self> {
        let loader = Self::new();
        loader.set_failing(true);
        loader
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn invocation(self: &Arc<Self>, method: &str, args: Vec<Value>) -> Invocation {
        Invocation::new(self.clone(), method, args)
    }
}

#[async_trait::async_trait]
impl Loader for CountingLoader {
    async fn load(&self, method: &str, args: &[Value]) -> anyhow::Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::Relaxed) {
            anyhow::bail!("loader {} failed on call {}", method, call);
        }
        Ok(json!({ "method": method, "args": args, "call": call }))
    }
}

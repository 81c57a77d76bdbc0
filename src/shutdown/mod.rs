// Package shutdown provides graceful shutdown functionality.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("graceful shutdown timeout exceeded")]
pub struct TimeoutError;

/// Waits for SIGINT or cancellation, then gives the tracked closers a
/// bounded time to finish.
pub struct GracefulShutdown {
    shutdown_token: CancellationToken,
    timeout: Duration,
    closers: Mutex<JoinSet<()>>,
}

impl GracefulShutdown {
    pub fn new(shutdown_token: CancellationToken, timeout: Duration) -> Self {
        Self {
            shutdown_token,
            timeout,
            closers: Mutex::new(JoinSet::new()),
        }
    }

    /// Runs `closer` in the background and waits for it during shutdown.
    /// Closers observe the shutdown token themselves.
    pub async fn track<F>(&self, closer: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.closers.lock().await.spawn(closer);
    }

    /// Waits for shutdown signal and then waits for all closers to complete.
    pub async fn await_shutdown(&self) -> Result<()> {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(
                    component = "graceful-shutdown",
                    event = "os_signal",
                    signal = "SIGINT",
                    "cancellation started"
                );
            }
            _ = self.shutdown_token.cancelled() => {
                info!(
                    component = "graceful-shutdown",
                    event = "ctx_done",
                    "cancellation started"
                );
            }
        }

        self.cancel_and_await_with_timeout().await
    }

    async fn cancel_and_await_with_timeout(&self) -> Result<()> {
        self.shutdown_token.cancel();

        let mut closers = self.closers.lock().await;
        let joined = timeout(self.timeout, async {
            while closers.join_next().await.is_some() {}
        })
        .await;
        match joined {
            Ok(()) => {
                info!(
                    component = "graceful-shutdown",
                    event = "shutdown_success",
                    "service was gracefully shut down"
                );
                Ok(())
            }
            Err(_) => {
                closers.abort_all();
                warn!(
                    component = "graceful-shutdown",
                    event = "shutdown_timeout",
                    timeout_secs = self.timeout.as_secs(),
                    "not all tasks were closed within timeout"
                );
                Err(TimeoutError.into())
            }
        }
    }
}

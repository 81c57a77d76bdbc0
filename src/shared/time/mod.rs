//! Cached wall clock in epoch milliseconds.
//!
//! Every timestamp the autoload machinery compares (request, load, wrapper
//! write time) goes through here so that all of them share one clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

static NOW_MILLIS: AtomicI64 = AtomicI64::new(0);

fn system_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Starts the clock ticker at the given resolution.
/// Until it is started (or after it is stopped) `now_millis` reads the system clock directly.
pub fn start(resolution: Duration) -> CancellationToken {
    NOW_MILLIS.store(system_millis(), Ordering::Relaxed);

    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::task::spawn(async move {
        let mut interval = tokio::time::interval(resolution);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    NOW_MILLIS.store(system_millis(), Ordering::Relaxed);
                }
                _ = token_clone.cancelled() => {
                    NOW_MILLIS.store(0, Ordering::Relaxed);
                    break;
                }
            }
        }
    });

    token
}

/// Returns the current time as Unix milliseconds.
pub fn now_millis() -> i64 {
    match NOW_MILLIS.load(Ordering::Relaxed) {
        0 => system_millis(),
        cached => cached,
    }
}

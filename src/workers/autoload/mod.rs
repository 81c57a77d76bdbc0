//! Background refresh of registered cache entries.

pub mod counters;
pub mod decision;
pub mod dispatcher;
pub mod handler;
pub mod refresher;
pub mod telemetry;

#[cfg(test)]
mod dispatcher_test;

// Re-export main types
pub use decision::{decide, refresh_threshold_ms, Decision, DemoteReason, SkipReason};
pub use dispatcher::Dispatcher;
pub use handler::AutoLoadHandler;
pub use refresher::{Outcome, Refresher};

#[path = "shared/time/mod.rs"]
pub mod time;
#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod config;
pub mod manager;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod shutdown;
pub mod store;
pub mod workers;

//! Foreground entry point used by the call interception layer.

pub mod manager;

#[cfg(test)]
mod manager_test;

// Re-export main types
pub use manager::CacheManager;

//! Metrics exported through the `metrics` facade.
//!
//! No recorder is installed by the library; the embedding process decides
//! where these go.

pub mod meter;

// Re-export commonly used items
pub use meter::*;

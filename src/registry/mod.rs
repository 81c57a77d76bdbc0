//! Concurrent registry of autoload jobs.

pub mod registry;
pub mod sort;


// Re-export main types
pub use registry::{AutoLoadRegistry, Comparator};
pub use sort::SortType;

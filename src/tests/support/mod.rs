//! Shared test doubles.

pub mod codec;
pub mod fixtures;
pub mod loader;

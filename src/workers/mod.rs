// Worker functionality for background cache refresh.

pub mod autoload;
pub mod backend;
pub mod config;

// Re-export main types
pub use autoload::AutoLoadHandler;
pub use backend::CacheStore;
pub use config::AutoLoadConfig;

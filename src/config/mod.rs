// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::registry::SortType;
use crate::store::StoreOptions;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const DEBUG: &str = "debug";
#[allow(dead_code)]
pub const TEST: &str = "test";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Cache {
    #[serde(rename = "cache")]
    pub cache: CacheBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheBox {
    #[serde(default = "default_env")]
    pub env: String,
    pub logs: Option<Logs>,
    pub runtime: Option<Runtime>,
    #[serde(default)]
    pub autoload: Autoload,
    pub store: Store,
}

fn default_env() -> String {
    DEV.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Runtime {
    /// Worker threads of the async runtime; 0 means every core.
    #[serde(default)]
    pub num_cpus: usize,
}

/// Background refresh settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Autoload {
    pub thread_cnt: usize,
    pub max_element: usize,
    #[serde(with = "humantime_serde")]
    pub auto_load_period: Duration,
    #[serde(with = "humantime_serde")]
    pub idle_interval: Duration,
    pub sort_type: SortType,
    pub check_from_cache_before_load: bool,
    pub print_slow_log: bool,
    #[serde(with = "humantime_serde")]
    pub slow_load_time: Duration,
    #[serde(with = "humantime_serde")]
    pub telemetry_interval: Duration,
}

impl Default for Autoload {
    fn default() -> Self {
        Self {
            thread_cnt: 10,
            max_element: 20_000,
            auto_load_period: Duration::from_millis(50),
            idle_interval: Duration::from_secs(1),
            sort_type: SortType::default(),
            check_from_cache_before_load: true,
            print_slow_log: true,
            slow_load_time: Duration::from_millis(500),
            telemetry_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Store {
    pub mode: StoreMode,
    #[serde(flatten)]
    pub options: StoreOptions,
    #[serde(default)]
    pub shards: Vec<Shard>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Shard {
    pub id: String,
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    16
}

pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_debug(&self) -> bool;
    #[allow(dead_code)]
    fn is_dev(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn runtime(&self) -> Option<&Runtime>;
    fn autoload(&self) -> &Autoload;
    fn store(&self) -> &Store;
}

pub type Config = Cache;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.cache.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.cache.env == PROD
    }

    fn is_debug(&self) -> bool {
        self.cache.env == DEBUG
    }

    fn is_dev(&self) -> bool {
        self.cache.env == DEV
    }

    fn is_test(&self) -> bool {
        self.cache.env == TEST
    }

    fn runtime(&self) -> Option<&Runtime> {
        self.cache.runtime.as_ref()
    }

    fn autoload(&self) -> &Autoload {
        &self.cache.autoload
    }

    fn store(&self) -> &Store {
        &self.cache.store
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::parse(&data).with_context(|| format!("load config from {:?}", abs_path))
    }

    /// Parses and validates a YAML document.
    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Cache = serde_yaml::from_str(data).context("unmarshal yaml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let autoload = self.autoload();
        if autoload.thread_cnt == 0 {
            anyhow::bail!("autoload.thread_cnt must be at least 1");
        }
        if autoload.max_element == 0 {
            anyhow::bail!("autoload.max_element must be at least 1");
        }
        let store = self.store();
        if store.mode == StoreMode::Redis && store.shards.is_empty() {
            anyhow::bail!("store.shards must list at least one shard in redis mode");
        }
        Ok(())
    }
}

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;

#[cfg(test)]
mod config_test;

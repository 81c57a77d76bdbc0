// Main entrypoint for the autoload cache daemon.

use autoloadcache::config::{Config, ConfigTrait, StoreMode};
use autoloadcache::model::{Codec, JsonCodec};
use autoloadcache::registry::AutoLoadRegistry;
use autoloadcache::shutdown::GracefulShutdown;
use autoloadcache::store::memory::MemoryShard;
use autoloadcache::store::{RedisShard, ShardConnection, ShardedStore};
use autoloadcache::time;
use autoloadcache::workers::{AutoLoadConfig, AutoLoadHandler, CacheStore};

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const CONFIG_PATH: &str = "cfg/autoloadcache.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/autoloadcache.cfg.local.yaml";

/// Autoload cache: background refresh of cached call results over a sharded store
///
/// Standalone harness: it runs the refresh engine over the configured store,
/// but nothing in this process registers entries, so its sweeps stay empty.
/// Applications embed the library and register entries through `CacheManager`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        return Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path));
    }

    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok(cfg),
        Err(_) => Config::load(PathBuf::from(CONFIG_PATH))
            .with_context(|| format!("failed to load config from {}", CONFIG_PATH)),
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

/// Builds the async runtime with the configured worker thread count.
fn build_runtime(cfg: &Config) -> Result<tokio::runtime::Runtime> {
    let configured = cfg.runtime().map(|r| r.num_cpus).unwrap_or(0);
    let cores = if configured == 0 {
        num_cpus::get()
    } else {
        configured
    };
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cores.max(1))
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

/// Connects the configured shards.
fn build_shards(cfg: &Config) -> Result<Vec<Arc<dyn ShardConnection>>> {
    let store = cfg.store();
    match store.mode {
        StoreMode::Memory => {
            warn!(
                component = "main",
                event = "memory_store",
                "using in-process store, values are not shared between nodes"
            );
            Ok(vec![Arc::new(MemoryShard::new("memory-0")) as Arc<dyn ShardConnection>])
        }
        StoreMode::Redis => store
            .shards
            .iter()
            .map(|shard| {
                let conn = RedisShard::connect(shard.id.clone(), &shard.url, shard.pool_size)
                    .with_context(|| format!("failed to build pool for shard {}", shard.id))?;
                info!(
                    component = "main",
                    event = "shard_configured",
                    shard = %shard.id,
                    pool_size = shard.pool_size,
                    "redis shard configured"
                );
                Ok(Arc::new(conn) as Arc<dyn ShardConnection>)
            })
            .collect(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = load_cfg(args.cfg)?;
    configure_logger(&cfg);

    build_runtime(&cfg)?.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    // Shared clock for every timestamp the refresh policy compares
    let ctime_token = time::start(Duration::from_millis(1));

    let codec: Arc<dyn Codec> = Arc::new(JsonCodec);
    let autoload_cfg = AutoLoadConfig::from(cfg.autoload());
    let registry = Arc::new(AutoLoadRegistry::new(autoload_cfg.max_element, codec.clone()));

    let store = Arc::new(ShardedStore::new(
        build_shards(&cfg)?,
        codec,
        cfg.store().options,
    ));
    store.attach_registry(registry.clone());
    info!(
        component = "main",
        event = "store_ready",
        shards = store.shard_count(),
        "sharded store ready"
    );

    let handler = AutoLoadHandler::new(
        &shutdown_token,
        autoload_cfg,
        registry,
        store as Arc<dyn CacheStore>,
    );
    handler.start().await;

    let graceful_shutdown = GracefulShutdown::new(shutdown_token.clone(), Duration::from_secs(60));
    let closing = handler.clone();
    let token = shutdown_token.clone();
    graceful_shutdown
        .track(async move {
            token.cancelled().await;
            closing.shutdown().await;
        })
        .await;

    info!(component = "main", event = "started", "autoload cache is running");

    // Listen for OS signals or cancellation and wait for graceful shutdown
    let result = graceful_shutdown.await_shutdown().await;
    ctime_token.cancel();
    if let Err(e) = result {
        error!(
            component = "main",
            scope = "service",
            event = "graceful_shutdown_failed",
            error = %e,
            "failed to gracefully shut down service"
        );
        return Err(e);
    }

    Ok(())
}

use super::{Autoload, CacheBox, Config, Logs, Runtime, Store, StoreMode};
use crate::registry::SortType;
use crate::store::StoreOptions;
use std::time::Duration;

/// Creates a new test configuration: in-memory store and fast ticks.
pub fn new_test_config() -> Config {
    Config {
        cache: CacheBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            runtime: Some(Runtime { num_cpus: 2 }),
            autoload: Autoload {
                thread_cnt: 2,
                max_element: 128,
                auto_load_period: Duration::from_millis(1),
                idle_interval: Duration::from_millis(10),
                sort_type: SortType::OldestFirst,
                check_from_cache_before_load: true,
                print_slow_log: true,
                slow_load_time: Duration::from_millis(500),
                telemetry_interval: Duration::from_millis(100),
            },
            store: Store {
                mode: StoreMode::Memory,
                options: StoreOptions::default(),
                shards: Vec::new(),
            },
        },
    }
}

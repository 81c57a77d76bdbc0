#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use crate::config::{Config, ConfigTrait, StoreMode};
    use crate::registry::SortType;

    const FULL: &str = r#"
cache:
  env: prod
  logs:
    level: warn
  runtime:
    num_cpus: 4
  autoload:
    thread_cnt: 3
    max_element: 500
    auto_load_period: 20ms
    idle_interval: 2s
    sort_type: load_cnt_asc
    check_from_cache_before_load: false
    print_slow_log: false
    slow_load_time: 1s
    telemetry_interval: 10s
  store:
    mode: redis
    hash_expire: 60
    hash_expire_by_script: true
    shards:
      - { id: shard-a, url: "redis://127.0.0.1:6379/0", pool_size: 8 }
      - { id: shard-b, url: "redis://127.0.0.1:6380/0" }
"#;

    #[test]
    fn test_parse_full_document() {
        let cfg = Config::parse(FULL).unwrap();

        assert!(cfg.is_prod());
        assert_eq!(cfg.logs().and_then(|l| l.level.as_deref()), Some("warn"));
        assert_eq!(cfg.runtime().map(|r| r.num_cpus), Some(4));

        let autoload = cfg.autoload();
        assert_eq!(autoload.thread_cnt, 3);
        assert_eq!(autoload.max_element, 500);
        assert_eq!(autoload.auto_load_period, Duration::from_millis(20));
        assert_eq!(autoload.idle_interval, Duration::from_secs(2));
        assert_eq!(autoload.sort_type, SortType::LoadCntAsc);
        assert!(!autoload.check_from_cache_before_load);
        assert!(!autoload.print_slow_log);
        assert_eq!(autoload.slow_load_time, Duration::from_secs(1));

        let store = cfg.store();
        assert_eq!(store.mode, StoreMode::Redis);
        assert_eq!(store.options.hash_expire, 60);
        assert!(store.options.hash_expire_by_script);
        assert_eq!(store.shards.len(), 2);
        assert_eq!(store.shards[0].pool_size, 8);
        assert_eq!(store.shards[1].pool_size, 16);
    }

    #[test]
    fn test_defaults_apply() {
        let cfg = Config::parse("cache:\n  store:\n    mode: memory\n").unwrap();

        assert!(cfg.is_dev());
        let autoload = cfg.autoload();
        assert_eq!(autoload.thread_cnt, 10);
        assert_eq!(autoload.max_element, 20_000);
        assert_eq!(autoload.auto_load_period, Duration::from_millis(50));
        assert_eq!(autoload.idle_interval, Duration::from_secs(1));
        assert_eq!(autoload.sort_type, SortType::OldestFirst);
        assert!(autoload.check_from_cache_before_load);
        assert_eq!(cfg.store().options.hash_expire, -1);
        assert!(!cfg.store().options.hash_expire_by_script);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let no_shards = "cache:\n  store:\n    mode: redis\n";
        assert!(Config::parse(no_shards).is_err());

        let no_threads = "cache:\n  autoload:\n    thread_cnt: 0\n  store:\n    mode: memory\n";
        assert!(Config::parse(no_threads).is_err());

        let no_room = "cache:\n  autoload:\n    max_element: 0\n  store:\n    mode: memory\n";
        assert!(Config::parse(no_room).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("autoloadcache-cfg-{}.yaml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        drop(file);

        let cfg = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.store().shards[0].id, "shard-a");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Config::load("/definitely/not/here.yaml").is_err());
    }
}

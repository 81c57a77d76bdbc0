#[cfg(test)]
mod tests {
    use crate::store::memory::MemoryShard;
    use crate::store::{ScriptCache, ShardConnection, DELETE_BY_PATTERN, HASH_SET_EXPIRE};

    async fn seed(shard: &MemoryShard) {
        shard.set(b"user:1", b"a", 0).await.unwrap();
        shard.set(b"user:2", b"b", 0).await.unwrap();
        shard.set(b"order:1", b"c", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_loads_once_per_shard() {
        let shard = MemoryShard::new("mem");
        let cache = ScriptCache::new(DELETE_BY_PATTERN);
        assert!(cache.cached(&shard).is_none());

        cache.eval(&shard, &[b"nothing:*".as_slice()], &[]).await.unwrap();
        cache.eval(&shard, &[b"nothing:*".as_slice()], &[]).await.unwrap();

        assert_eq!(shard.script_loads(), 1);
        assert_eq!(shard.evals(), 2);
        assert!(cache.cached(&shard).is_some());
    }

    #[tokio::test]
    async fn test_unknown_identifier_reloads_and_retries_once() {
        let shard = MemoryShard::new("mem");
        seed(&shard).await;
        let cache = ScriptCache::new(DELETE_BY_PATTERN);
        cache.ensure_loaded(&shard).await.unwrap();
        shard.fail_next_evals(1);

        let mut deleted = cache
            .eval(&shard, &[b"user:*".as_slice()], &[])
            .await
            .expect("retry must succeed");
        deleted.sort();

        assert_eq!(deleted, vec!["user:1".to_string(), "user:2".to_string()]);
        // One extra load and one extra execution.
        assert_eq!(shard.script_loads(), 2);
        assert_eq!(shard.evals(), 2);
        assert!(shard.contains("order:1"));
    }

    #[tokio::test]
    async fn test_second_failure_is_swallowed() {
        let shard = MemoryShard::new("mem");
        seed(&shard).await;
        let cache = ScriptCache::new(DELETE_BY_PATTERN);
        shard.fail_next_evals(2);

        let result = cache.eval(&shard, &[b"user:*".as_slice()], &[]).await;

        assert!(result.is_none());
        assert_eq!(shard.evals(), 2);
        assert!(cache.cached(&shard).is_none());
        assert!(shard.contains("user:1"));
    }

    #[tokio::test]
    async fn test_recovers_after_server_restart() {
        let shard = MemoryShard::new("mem");
        let cache = ScriptCache::new(HASH_SET_EXPIRE);
        cache
            .eval(&shard, &[b"h".as_slice(), b"f".as_slice()], &[b"v".as_slice(), b"60".as_slice()])
            .await
            .unwrap();

        shard.flush_scripts();
        let reply = cache
            .eval(&shard, &[b"h".as_slice(), b"g".as_slice()], &[b"w".as_slice(), b"60".as_slice()])
            .await;

        assert_eq!(reply, Some(Vec::new()));
        assert_eq!(shard.script_loads(), 2);
        assert_eq!(shard.hash_field_ttl("h", "g"), Some(60));
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_retried() {
        let shard = MemoryShard::new("mem");
        let cache = ScriptCache::new(DELETE_BY_PATTERN);
        cache.ensure_loaded(&shard).await.unwrap();
        shard.set_offline(true);

        let result = cache.eval(&shard, &[b"user:*".as_slice()], &[]).await;

        assert!(result.is_none());
        assert_eq!(shard.script_loads(), 1);
        assert!(cache.cached(&shard).is_some());
    }

    #[tokio::test]
    async fn test_identifiers_are_per_shard() {
        let a = MemoryShard::new("a");
        let b = MemoryShard::new("b");
        let cache = ScriptCache::new(DELETE_BY_PATTERN);
        cache.ensure_loaded(&a).await.unwrap();
        cache.invalidate(&b);

        assert!(cache.cached(&a).is_some());
        assert!(cache.cached(&b).is_none());
    }
}

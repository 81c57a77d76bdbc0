#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::model::{AutoLoadEntry, CacheKey, JsonCodec};
    use crate::registry::{AutoLoadRegistry, SortType};
    use crate::support::fixtures::register;
    use crate::workers::autoload::counters::Counters;
    use crate::workers::autoload::Dispatcher;

    fn seeded_registry() -> Arc<AutoLoadRegistry> {
        let registry = Arc::new(AutoLoadRegistry::new(16, Arc::new(JsonCodec)));
        for (key, last_load) in [("a", 3_000), ("b", 1_000), ("c", 2_000)] {
            register(&registry, key, 300);
            registry
                .get(&CacheKey::new(key))
                .unwrap()
                .set_last_load_time(last_load);
        }
        registry
    }

    fn queued(tx: &mpsc::Sender<Arc<AutoLoadEntry>>) -> usize {
        tx.max_capacity() - tx.capacity()
    }

    async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
        for _ in 0..400 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {what}");
    }

    #[tokio::test]
    async fn test_next_sweep_waits_for_drained_queue() {
        let registry = seeded_registry();
        let (tx, mut rx) = mpsc::channel(8);
        let counters = Arc::new(Counters::new());
        let dispatcher = Dispatcher::new(
            registry,
            tx.clone(),
            SortType::OldestFirst,
            Duration::from_millis(10),
            counters.clone(),
        );
        let ctx = CancellationToken::new();
        let task = tokio::spawn(dispatcher.run(ctx.clone()));

        eventually("the first sweep", || queued(&tx) == 3).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counters.sweeps.load(Ordering::Relaxed), 1);
        assert_eq!(queued(&tx), 3);

        let mut keys = Vec::new();
        for _ in 0..3 {
            keys.push(rx.recv().await.unwrap().full_key().to_string());
        }
        assert_eq!(keys, vec!["b", "c", "a"]);

        eventually("the second sweep", || {
            counters.sweeps.load(Ordering::Relaxed) == 2
        })
        .await;

        ctx.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_registry_never_sweeps() {
        let registry = Arc::new(AutoLoadRegistry::new(16, Arc::new(JsonCodec)));
        let (tx, _rx) = mpsc::channel(8);
        let counters = Arc::new(Counters::new());
        let dispatcher = Dispatcher::new(
            registry,
            tx.clone(),
            SortType::OldestFirst,
            Duration::from_millis(5),
            counters.clone(),
        );
        let ctx = CancellationToken::new();
        let task = tokio::spawn(dispatcher.run(ctx.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counters.sweeps.load(Ordering::Relaxed), 0);
        assert_eq!(queued(&tx), 0);

        ctx.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_pending_counts_untaken_entries() {
        let registry = seeded_registry();
        let (tx, mut rx) = mpsc::channel(8);
        let dispatcher = Dispatcher::new(
            registry.clone(),
            tx.clone(),
            SortType::None,
            Duration::from_millis(10),
            Arc::new(Counters::new()),
        );
        assert_eq!(dispatcher.pending(), 0);

        for entry in registry.snapshot(None).into_iter().take(2) {
            tx.send(entry).await.unwrap();
        }
        assert_eq!(dispatcher.pending(), 2);

        rx.recv().await.unwrap();
        assert_eq!(dispatcher.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_queue_idles_between_attempts() {
        let registry = seeded_registry();
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let counters = Arc::new(Counters::new());
        let dispatcher = Dispatcher::new(
            registry,
            tx,
            SortType::OldestFirst,
            Duration::from_millis(10),
            counters.clone(),
        );
        let ctx = CancellationToken::new();
        let task = tokio::spawn(dispatcher.run(ctx.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let sweeps = counters.sweeps.load(Ordering::Relaxed);
        assert!((1..=11).contains(&sweeps), "sweeps = {sweeps}");

        ctx.cancel();
        task.await.unwrap();
    }
}

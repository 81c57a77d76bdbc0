#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::store::memory::MemoryShard;
    use crate::store::{ShardConnection, ShardRouter};

    fn router(n: usize) -> ShardRouter {
        ShardRouter::new(
            (0..n)
                .map(|i| Arc::new(MemoryShard::new(format!("mem-{i}"))) as Arc<dyn ShardConnection>)
                .collect(),
        )
    }

    #[test]
    fn test_route_is_stable() {
        let router = router(4);
        for i in 0..100 {
            let key = format!("user:{i}");
            let a = router.route(&key).unwrap().id().to_string();
            let b = router.route(&key).unwrap().id().to_string();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_route_spreads_keys() {
        let router = router(4);
        let mut seen = std::collections::HashSet::new();
        for i in 0..200 {
            seen.insert(router.route(&format!("user:{i}")).unwrap().id().to_string());
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_empty_router_routes_nowhere() {
        let router = router(0);
        assert!(router.is_empty());
        assert!(router.route("user:1").is_none());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::model::{AutoLoadEntry, CacheKey, CachePolicy};
    use crate::support::loader::CountingLoader;

    fn make_entry() -> AutoLoadEntry {
        let invocation = CountingLoader::new().invocation("find_user", vec![json!(1)]);
        AutoLoadEntry::new(CacheKey::new("user:1"), invocation, CachePolicy::new(300))
    }

    #[test]
    fn test_touch_request_sets_first_time_once() {
        let entry = make_entry();
        entry.touch_request(1_000);
        entry.touch_request(2_000);
        entry.touch_request(3_000);

        assert_eq!(entry.first_request_time(), 1_000);
        assert_eq!(entry.last_request_time(), 3_000);
        assert_eq!(entry.request_times(), 3);
    }

    #[test]
    fn test_average_use_time_is_running_mean() {
        let entry = make_entry();
        assert_eq!(entry.average_use_time(), 0);

        let guard = entry.try_begin_load().expect("entry must be idle");
        entry.record_load(&guard, 10, 5_000);
        entry.record_load(&guard, 30, 6_000);
        drop(guard);

        assert_eq!(entry.load_cnt(), 2);
        assert_eq!(entry.average_use_time(), 20);
        assert_eq!(entry.last_load_time(), 6_000);
    }

    #[test]
    fn test_load_guard_is_exclusive_and_released_on_drop() {
        let entry = make_entry();
        let guard = entry.try_begin_load();
        assert!(guard.is_some());
        assert!(entry.is_loading());
        assert!(entry.try_begin_load().is_none(), "second claim must fail");

        drop(guard);
        assert!(!entry.is_loading());
        assert!(entry.try_begin_load().is_some());
    }

    #[test]
    fn test_full_key_is_cached() {
        let invocation = CountingLoader::new().invocation("find", vec![]);
        let entry = AutoLoadEntry::new(
            CacheKey::with_hfield("users", "7"),
            invocation,
            CachePolicy::new(300),
        );
        assert_eq!(entry.full_key(), "users:7");
    }
}

#[cfg(test)]
mod tests {
    use crate::model::CacheKey;

    #[test]
    fn test_full_key_without_field() {
        let key = CacheKey::new("user:1");
        assert_eq!(key.full_key(), "user:1");
        assert_eq!(key.hfield(), None);
    }

    #[test]
    fn test_full_key_with_field() {
        let key = CacheKey::with_hfield("user", "1");
        assert_eq!(key.full_key(), "user:1");
        assert_eq!(key.key(), "user");
        assert_eq!(key.hfield(), Some("1"));
    }

    #[test]
    fn test_empty_field_is_dropped() {
        assert_eq!(CacheKey::with_hfield("user", ""), CacheKey::new("user"));
    }

    #[test]
    fn test_equality_needs_both_components() {
        assert_ne!(CacheKey::with_hfield("user", "1"), CacheKey::with_hfield("user", "2"));
        assert_ne!(CacheKey::with_hfield("user", "1"), CacheKey::new("user"));
        assert_eq!(CacheKey::with_hfield("user", "1"), CacheKey::with_hfield("user", "1"));
    }

    #[test]
    fn test_pattern_detection() {
        assert!(CacheKey::new("*").is_flush_all());
        assert!(CacheKey::new("*").is_pattern());
        assert!(CacheKey::new("user:*").is_pattern());
        assert!(!CacheKey::new("user:*").is_flush_all());
        assert!(CacheKey::new("user:?").is_pattern());
        assert!(!CacheKey::new("user:1").is_pattern());
    }
}

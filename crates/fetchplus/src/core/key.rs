/// Namespace separating our entries from other users of a shared store.
pub const CACHE_KEY_PREFIX: &str = "fetchplus:";

/// Deterministic cache key for a URL. Case-insensitive.
///
/// ```
/// use fetchplus::cache_key;
///
/// assert_eq!(cache_key("http://X.com/a"), cache_key("http://x.com/a"));
/// assert_ne!(cache_key("http://x.com/a"), cache_key("http://x.com/b"));
/// ```
pub fn cache_key(url: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{}", url.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_ignore_case() {
        assert_eq!(cache_key("http://X.com/a"), cache_key("http://x.com/a"));
        assert_eq!(cache_key("http://x.com/PATH"), "fetchplus:http://x.com/path");
    }

    #[test]
    fn keys_differ_by_path() {
        assert_ne!(cache_key("http://x.com/a"), cache_key("http://x.com/b"));
    }

    #[test]
    fn keys_are_namespaced() {
        assert!(cache_key("http://x.com/a").starts_with(CACHE_KEY_PREFIX));
    }
}

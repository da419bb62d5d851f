use serde_json::json;

use crate::models::FetchArgs;

/// Deterministic cache key for a method call.
///
/// MD5 hex digest of the canonical JSON document
/// `{"args": [...], "func": method, "kwargs": {...}}`. Object keys serialize
/// sorted, so keyword order never changes the key.
pub fn cache_key(method: &str, args: &FetchArgs) -> String {
    let document = json!({
        "func": method,
        "args": args.positional,
        "kwargs": args.keyword,
    });
    format!("{:x}", md5::compute(document.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable() {
        let args = FetchArgs::positional(["AAPL", "2024-01-01", "2024-01-31"]);
        let key = cache_key("get_stock_data", &args);
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key("get_stock_data", &args.clone()));
    }

    #[test]
    fn test_keyword_order_does_not_matter() {
        let a = FetchArgs::new().kwarg("symbol", "AAPL").kwarg("limit", 5);
        let b = FetchArgs::new().kwarg("limit", 5).kwarg("symbol", "AAPL");
        assert_eq!(cache_key("get_news", &a), cache_key("get_news", &b));
    }

    #[test]
    fn test_method_and_args_distinguish_keys() {
        let args = FetchArgs::positional(["AAPL"]);
        assert_ne!(
            cache_key("get_news", &args),
            cache_key("get_fundamentals", &args)
        );
        assert_ne!(
            cache_key("get_news", &args),
            cache_key("get_news", &FetchArgs::positional(["MSFT"]))
        );
        // A positional value is not the same request as a keyword one
        assert_ne!(
            cache_key("get_news", &args),
            cache_key("get_news", &FetchArgs::new().kwarg("0", "AAPL"))
        );
    }
}

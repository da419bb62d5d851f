//! Runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::RetryDefaults;

/// Cache layer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory of the durable tier.
    pub dir: PathBuf,
    /// Maximum age of an entry in either tier.
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data_cache"),
            ttl: Duration::from_secs(24 * 3600),
        }
    }
}

/// Everything needed to build a [`FetchManager`](crate::FetchManager).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataflowsConfig {
    pub cache: CacheConfig,
    pub retry: RetryDefaults,
}

impl DataflowsConfig {
    /// Read overrides from `TA_*` environment variables.
    ///
    /// Unset or unparseable values keep their defaults. Loading a `.env` file
    /// is left to the binary.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Option<u64> {
            lookup(key).and_then(|value| value.trim().parse().ok())
        };
        let millis = |key: &str| number(key).map(Duration::from_millis);

        let mut config = Self::default();

        if let Some(dir) = lookup("TA_CACHE_DIR").filter(|dir| !dir.trim().is_empty()) {
            config.cache.dir = PathBuf::from(dir);
        }
        if let Some(hours) = number("TA_CACHE_TTL_HOURS") {
            config.cache.ttl = Duration::from_secs(hours.saturating_mul(3600));
        }

        let retry = &mut config.retry;
        if let Some(value) = number("TA_MAX_RETRIES").and_then(|v| u32::try_from(v).ok()) {
            if value > 0 {
                retry.max_retries = value;
            }
        }
        if let Some(value) = millis("TA_RETRY_DELAY_BASE_MS") {
            retry.retry_delay_base = value;
        }
        if let Some(value) = millis("TA_RETRY_DELAY_MAX_MS") {
            retry.retry_delay_max = value;
        }
        if let Some(value) = millis("TA_RATE_LIMIT_WAIT_MS") {
            retry.rate_limit_wait = value;
        }
        if let Some(value) =
            number("TA_RATE_LIMIT_MAX_RETRIES").and_then(|v| u32::try_from(v).ok())
        {
            retry.rate_limit_max_retries = value;
        }
        if retry.retry_delay_max < retry.retry_delay_base {
            retry.retry_delay_max = retry.retry_delay_base;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DataflowsConfig::from_lookup(|_| None);
        assert_eq!(config, DataflowsConfig::default());
        assert_eq!(config.cache.dir, PathBuf::from("./data_cache"));
        assert_eq!(config.cache.ttl, Duration::from_secs(86_400));
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_overrides() {
        let config = DataflowsConfig::from_lookup(lookup(&[
            ("TA_CACHE_DIR", "/tmp/ta-cache"),
            ("TA_CACHE_TTL_HOURS", "6"),
            ("TA_MAX_RETRIES", "5"),
            ("TA_RETRY_DELAY_BASE_MS", "250"),
            ("TA_RETRY_DELAY_MAX_MS", "4000"),
            ("TA_RATE_LIMIT_WAIT_MS", "12000"),
            ("TA_RATE_LIMIT_MAX_RETRIES", "2"),
        ]));

        assert_eq!(config.cache.dir, PathBuf::from("/tmp/ta-cache"));
        assert_eq!(config.cache.ttl, Duration::from_secs(6 * 3600));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.retry_delay_base, Duration::from_millis(250));
        assert_eq!(config.retry.retry_delay_max, Duration::from_secs(4));
        assert_eq!(config.retry.rate_limit_wait, Duration::from_secs(12));
        assert_eq!(config.retry.rate_limit_max_retries, 2);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = DataflowsConfig::from_lookup(lookup(&[
            ("TA_CACHE_DIR", "  "),
            ("TA_CACHE_TTL_HOURS", "a day"),
            ("TA_MAX_RETRIES", "0"),
            ("TA_RATE_LIMIT_MAX_RETRIES", "-1"),
        ]));
        assert_eq!(config, DataflowsConfig::default());
    }

    #[test]
    fn test_delay_max_never_below_base() {
        let config = DataflowsConfig::from_lookup(lookup(&[("TA_RETRY_DELAY_BASE_MS", "20000")]));
        assert_eq!(config.retry.retry_delay_max, Duration::from_secs(20));
    }
}

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cached result, identical in both tiers.
///
/// Serialized to disk as `{cacheKey, methodName, payload, cachedAt}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub cache_key: String,
    pub method_name: String,
    pub payload: Value,
    pub cached_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(cache_key: impl Into<String>, method_name: impl Into<String>, payload: Value) -> Self {
        Self {
            cache_key: cache_key.into(),
            method_name: method_name.into(),
            payload,
            cached_at: Utc::now(),
        }
    }

    /// Age at `now`. Timestamps in the future (clock skew) count as age zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.cached_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}

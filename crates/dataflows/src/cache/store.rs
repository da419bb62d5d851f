use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::task;

use super::disk::DiskTier;
use super::memory::MemoryTier;
use super::{cache_key, CacheRecord};
use crate::config::CacheConfig;
use crate::errors::CacheError;
use crate::models::FetchArgs;

/// Entry counts of both tiers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub fast_count: usize,
    pub durable_count: usize,
    pub ttl: Duration,
    pub dir: PathBuf,
}

/// Two-tier result cache.
///
/// Lookups try the in-process tier, then the disk tier, promoting disk hits.
/// Stale entries are removed when they are found, there is no background
/// sweep. Durable-tier failures degrade to a miss or a skipped write.
///
/// The synchronous methods touch the disk on the calling thread. Async code
/// goes through the fetch path, which moves disk access to the blocking pool.
#[derive(Debug)]
pub struct DataCache {
    ttl: Duration,
    fast: MemoryTier,
    durable: Arc<DiskTier>,
}

impl DataCache {
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let durable = DiskTier::open(&config.dir)?;
        info!(
            "Data cache at {} (ttl {:?})",
            durable.dir().display(),
            config.ttl
        );
        Ok(Self {
            ttl: config.ttl,
            fast: MemoryTier::default(),
            durable: Arc::new(durable),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached result of `method(args)`, if one is fresh.
    pub fn get(&self, method: &str, args: &FetchArgs) -> Option<Value> {
        self.get_by_key(&cache_key(method, args))
    }

    /// Store `value` as the result of `method(args)` in both tiers.
    pub fn set(&self, method: &str, value: &Value, args: &FetchArgs) {
        self.set_by_key(&cache_key(method, args), method, value.clone());
    }

    pub(crate) fn get_by_key(&self, key: &str) -> Option<Value> {
        let now = Utc::now();
        if let Some(value) = self.get_fast(key, now) {
            return Some(value);
        }
        let record = load_fresh(&self.durable, key, self.ttl, now)?;
        Some(self.promote(record))
    }

    pub(crate) fn set_by_key(&self, key: &str, method: &str, value: Value) {
        let record = Arc::new(CacheRecord::new(key, method, value));
        persist(&self.durable, &record);
        self.fast.insert(record);
    }

    /// [`get_by_key`](Self::get_by_key) with the disk read on the blocking pool.
    pub(crate) async fn load(&self, key: &str) -> Option<Value> {
        let now = Utc::now();
        if let Some(value) = self.get_fast(key, now) {
            return Some(value);
        }

        let durable = Arc::clone(&self.durable);
        let owned_key = key.to_string();
        let ttl = self.ttl;
        let record = match task::spawn_blocking(move || load_fresh(&durable, &owned_key, ttl, now))
            .await
        {
            Ok(record) => record?,
            Err(e) => {
                warn!("Cache read task for {} failed: {}", key, e);
                return None;
            }
        };
        Some(self.promote(record))
    }

    /// [`set_by_key`](Self::set_by_key) with the disk write on the blocking pool.
    pub(crate) async fn store(&self, key: &str, method: &str, value: Value) {
        let record = Arc::new(CacheRecord::new(key, method, value));
        let durable = Arc::clone(&self.durable);
        let pending = Arc::clone(&record);
        if let Err(e) = task::spawn_blocking(move || persist(&durable, &pending)).await {
            warn!("Cache write task for '{}' failed: {}", method, e);
        }
        self.fast.insert(record);
    }

    fn get_fast(&self, key: &str, now: DateTime<Utc>) -> Option<Value> {
        let record = self.fast.get(key, self.ttl, now)?;
        debug!("Cache hit (memory) for {}", key);
        Some(record.payload.clone())
    }

    fn promote(&self, record: CacheRecord) -> Value {
        debug!("Cache hit (disk) for {}", record.cache_key);
        let record = Arc::new(record);
        self.fast.insert(Arc::clone(&record));
        record.payload.clone()
    }

    /// Remove entries from both tiers, optionally only those of one method.
    ///
    /// Returns the number of durable records removed.
    pub fn clear(&self, method: Option<&str>) -> usize {
        let fast = self.fast.clear(method);
        let durable = self.durable.clear(method);
        info!(
            "Cleared cache{}: {} memory and {} disk entries",
            method.map(|m| format!(" for '{}'", m)).unwrap_or_default(),
            fast,
            durable
        );
        durable
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            fast_count: self.fast.len(),
            durable_count: self.durable.count(),
            ttl: self.ttl,
            dir: self.durable.dir().to_path_buf(),
        }
    }
}

fn load_fresh(
    durable: &DiskTier,
    key: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Option<CacheRecord> {
    let record = durable.load(key)?;
    if !record.is_fresh(ttl, now) {
        debug!("Evicting stale cache file for {}", key);
        durable.remove(key);
        return None;
    }
    Some(record)
}

fn persist(durable: &DiskTier, record: &CacheRecord) {
    if let Err(e) = durable.store(record) {
        warn!(
            "Failed to persist cache entry for '{}': {}",
            record.method_name, e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cache(ttl: Duration) -> (DataCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = DataCache::new(CacheConfig::new(dir.path()).with_ttl(ttl)).unwrap();
        (cache, dir)
    }

    fn args() -> FetchArgs {
        FetchArgs::positional(["AAPL", "2024-01-01", "2024-01-31"])
    }

    #[test]
    fn test_set_then_get() {
        let (cache, _dir) = cache(Duration::from_secs(3600));
        let value = json!({"close": [1.0, 2.0]});
        cache.set("get_stock_data", &value, &args());

        assert_eq!(cache.get("get_stock_data", &args()), Some(value));
        assert_eq!(cache.get("get_news", &args()), None);

        let stats = cache.stats();
        assert_eq!(stats.fast_count, 1);
        assert_eq!(stats.durable_count, 1);
    }

    #[test]
    fn test_expired_entry_removed_from_both_tiers() {
        let (cache, _dir) = cache(Duration::ZERO);
        cache.set("get_stock_data", &json!(1), &args());
        assert_eq!(cache.stats().durable_count, 1);

        assert_eq!(cache.get("get_stock_data", &args()), None);
        let stats = cache.stats();
        assert_eq!(stats.fast_count, 0);
        assert_eq!(stats.durable_count, 0);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, _dir) = cache(Duration::from_millis(50));
        cache.set("get_news", &json!(["headline"]), &args());
        assert!(cache.get("get_news", &args()).is_some());

        std::thread::sleep(Duration::from_millis(80));
        assert!(cache.get("get_news", &args()).is_none());
        assert_eq!(cache.stats().durable_count, 0);
    }

    #[test]
    fn test_disk_hit_is_promoted() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig::new(dir.path());

        let writer = DataCache::new(config.clone()).unwrap();
        writer.set("get_fundamentals", &json!({"pe": 30}), &args());

        // A second instance shares only the durable tier
        let reader = DataCache::new(config).unwrap();
        assert_eq!(reader.stats().fast_count, 0);
        assert_eq!(
            reader.get("get_fundamentals", &args()),
            Some(json!({"pe": 30}))
        );
        assert_eq!(reader.stats().fast_count, 1);
    }

    #[test]
    fn test_clear_with_filter() {
        let (cache, _dir) = cache(Duration::from_secs(3600));
        cache.set("get_news", &json!(1), &args());
        cache.set("get_stock_data", &json!(2), &args());

        assert_eq!(cache.clear(Some("get_news")), 1);
        assert!(cache.get("get_news", &args()).is_none());
        assert!(cache.get("get_stock_data", &args()).is_some());

        assert_eq!(cache.clear(None), 1);
        assert_eq!(cache.stats().fast_count, 0);
    }

    #[tokio::test]
    async fn test_async_store_then_load() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig::new(dir.path());
        let key = cache_key("get_news", &args());

        let writer = DataCache::new(config.clone()).unwrap();
        writer.store(&key, "get_news", json!(["headline"])).await;
        assert_eq!(writer.stats().durable_count, 1);
        assert_eq!(writer.load(&key).await, Some(json!(["headline"])));

        // Served from disk by a fresh instance, then promoted
        let reader = DataCache::new(config).unwrap();
        assert_eq!(reader.load(&key).await, Some(json!(["headline"])));
        assert_eq!(reader.stats().fast_count, 1);
        assert_eq!(reader.get("get_news", &args()), Some(json!(["headline"])));
    }

    #[tokio::test]
    async fn test_async_load_evicts_stale_file() {
        let (cache, _dir) = cache(Duration::ZERO);
        let key = cache_key("get_stock_data", &args());
        cache.store(&key, "get_stock_data", json!(1)).await;

        assert_eq!(cache.load(&key).await, None);
        assert_eq!(cache.stats().durable_count, 0);
    }

    #[test]
    fn test_stats_report_settings() {
        let (cache, dir) = cache(Duration::from_secs(60));
        let stats = cache.stats();
        assert_eq!(stats.ttl, Duration::from_secs(60));
        assert_eq!(stats.dir, dir.path());
    }
}

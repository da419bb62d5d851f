//! Fast in-process tier.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::CacheRecord;

/// Sharded concurrent map of cache records.
///
/// Readers of different keys never contend; a write locks only its shard.
#[derive(Debug, Default)]
pub(crate) struct MemoryTier {
    entries: DashMap<String, Arc<CacheRecord>>,
}

impl MemoryTier {
    /// Fresh record for `key`. A stale record is evicted and reported as absent.
    pub fn get(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> Option<Arc<CacheRecord>> {
        let record = self.entries.get(key).map(|entry| Arc::clone(entry.value()))?;
        if record.is_fresh(ttl, now) {
            return Some(record);
        }
        // Only evict the record we judged stale, not one written since.
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, &record));
        None
    }

    pub fn insert(&self, record: Arc<CacheRecord>) {
        self.entries.insert(record.cache_key.clone(), record);
    }

    /// Remove entries, optionally only those of one method. Returns the count removed.
    pub fn clear(&self, method: Option<&str>) -> usize {
        let before = self.entries.len();
        match method {
            Some(method) => self.entries.retain(|_, record| record.method_name != method),
            None => self.entries.clear(),
        }
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn record(key: &str, method: &str) -> Arc<CacheRecord> {
        Arc::new(CacheRecord::new(key, method, json!({ "key": key })))
    }

    #[test]
    fn test_insert_and_get() {
        let tier = MemoryTier::default();
        tier.insert(record("k1", "get_news"));

        let hit = tier.get("k1", DAY, Utc::now()).unwrap();
        assert_eq!(hit.payload, json!({ "key": "k1" }));
        assert!(tier.get("missing", DAY, Utc::now()).is_none());
    }

    #[test]
    fn test_stale_entry_is_evicted() {
        let tier = MemoryTier::default();
        tier.insert(record("k1", "get_news"));

        let later = Utc::now() + chrono::Duration::hours(25);
        assert!(tier.get("k1", DAY, later).is_none());
        assert_eq!(tier.len(), 0);
    }

    #[test]
    fn test_clear_by_method() {
        let tier = MemoryTier::default();
        tier.insert(record("k1", "get_news"));
        tier.insert(record("k2", "get_news"));
        tier.insert(record("k3", "get_stock_data"));

        assert_eq!(tier.clear(Some("get_news")), 2);
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.clear(None), 1);
        assert_eq!(tier.len(), 0);
    }
}

//! Lock-free call counters shared between concurrent fetches.
//!
//! Counters are plain atomics; the handful of nullable fields (last error,
//! last success, last vendor used) sit behind small mutexes. Counters are
//! only cleared by an explicit reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::warn;

use crate::errors::VendorError;
use crate::models::{FetchStats, GlobalStats, VendorStats};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("{} mutex was poisoned, recovering", what);
        poisoned.into_inner()
    })
}

/// Atomic counterpart of [`FetchStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    total_calls: AtomicU64,
    successful_calls: AtomicU64,
    failed_calls: AtomicU64,
    rate_limit_hits: AtomicU64,
    wait_micros: AtomicU64,
}

impl StatsCounters {
    pub fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_hit(&self) {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wait(&self, wait: Duration) {
        let micros = u64::try_from(wait.as_micros()).unwrap_or(u64::MAX);
        self.wait_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FetchStats {
        FetchStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            successful_calls: self.successful_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            rate_limit_hits: self.rate_limit_hits.load(Ordering::Relaxed),
            total_wait_time: Duration::from_micros(self.wait_micros.load(Ordering::Relaxed)),
        }
    }

    pub fn reset(&self) {
        self.total_calls.store(0, Ordering::Relaxed);
        self.successful_calls.store(0, Ordering::Relaxed);
        self.failed_calls.store(0, Ordering::Relaxed);
        self.rate_limit_hits.store(0, Ordering::Relaxed);
        self.wait_micros.store(0, Ordering::Relaxed);
    }
}

/// Per-vendor runtime state, created at registration and never removed.
#[derive(Debug, Default)]
pub(crate) struct VendorRuntimeState {
    pub counters: StatsCounters,
    last_error: Mutex<Option<String>>,
    last_success: Mutex<Option<DateTime<Utc>>>,
}

impl VendorRuntimeState {
    pub fn record_success(&self) {
        self.counters.record_success();
        *lock(&self.last_success, "Vendor state") = Some(Utc::now());
    }

    pub fn record_failure(&self, error: &VendorError) {
        self.counters.record_failure();
        *lock(&self.last_error, "Vendor state") = Some(error.to_string());
    }

    pub fn snapshot(&self, name: &str) -> VendorStats {
        VendorStats {
            name: name.to_string(),
            calls: self.counters.snapshot(),
            last_error: lock(&self.last_error, "Vendor state").clone(),
            last_success: *lock(&self.last_success, "Vendor state"),
        }
    }

    pub fn reset(&self) {
        self.counters.reset();
        *lock(&self.last_error, "Vendor state") = None;
        *lock(&self.last_success, "Vendor state") = None;
    }
}

/// Manager-wide counters.
#[derive(Debug, Default)]
pub(crate) struct GlobalCounters {
    pub counters: StatsCounters,
    cache_hits: AtomicU64,
    coalesced_calls: AtomicU64,
    last_vendor_used: Mutex<Option<String>>,
}

impl GlobalCounters {
    /// Mark a success as served from the cache. The call and the success are
    /// recorded separately.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_last_vendor_used(&self, vendor: &str) {
        *lock(&self.last_vendor_used, "Global stats") = Some(vendor.to_string());
    }

    pub fn last_vendor_used(&self) -> Option<String> {
        lock(&self.last_vendor_used, "Global stats").clone()
    }

    pub fn snapshot(&self) -> GlobalStats {
        GlobalStats {
            calls: self.counters.snapshot(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            coalesced_calls: self.coalesced_calls.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.counters.reset();
        self.cache_hits.store(0, Ordering::Relaxed);
        self.coalesced_calls.store(0, Ordering::Relaxed);
        *lock(&self.last_vendor_used, "Global stats") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot_and_reset() {
        let counters = StatsCounters::default();
        counters.record_call();
        counters.record_call();
        counters.record_success();
        counters.record_failure();
        counters.record_rate_limit_hit();
        counters.record_wait(Duration::from_millis(1500));

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.total_calls, 2);
        assert_eq!(snapshot.successful_calls, 1);
        assert_eq!(snapshot.failed_calls, 1);
        assert_eq!(snapshot.rate_limit_hits, 1);
        assert_eq!(snapshot.total_wait_time, Duration::from_millis(1500));

        counters.reset();
        assert_eq!(counters.snapshot(), FetchStats::default());
    }

    #[test]
    fn test_vendor_state_tracks_last_error_and_success() {
        let state = VendorRuntimeState::default();
        state.record_failure(&VendorError::other("connection reset"));
        state.record_success();

        let stats = state.snapshot("yfinance");
        assert_eq!(stats.name, "yfinance");
        assert_eq!(stats.last_error.as_deref(), Some("connection reset"));
        assert!(stats.last_success.is_some());
        assert_eq!(stats.calls.failed_calls, 1);
        assert_eq!(stats.calls.successful_calls, 1);

        state.reset();
        let stats = state.snapshot("yfinance");
        assert!(stats.last_error.is_none());
        assert!(stats.last_success.is_none());
    }

    #[test]
    fn test_global_snapshot_and_reset() {
        let global = GlobalCounters::default();
        global.counters.record_call();
        global.counters.record_success();
        global.record_cache_hit();
        global.record_coalesced();
        global.set_last_vendor_used("longbridge");

        let stats = global.snapshot();
        assert_eq!(stats.calls.total_calls, 1);
        assert_eq!(stats.calls.successful_calls, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.coalesced_calls, 1);
        assert_eq!(global.last_vendor_used().as_deref(), Some("longbridge"));

        global.reset();
        assert_eq!(global.snapshot(), GlobalStats::default());
        assert!(global.last_vendor_used().is_none());
    }
}

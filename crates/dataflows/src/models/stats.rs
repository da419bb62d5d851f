use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Call counters, kept once globally and once per vendor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub rate_limit_hits: u64,
    /// Cumulative backoff time, both generic and rate-limit waits.
    pub total_wait_time: Duration,
}

/// Global counters.
///
/// `calls.successful_calls` includes cache hits and coalesced waiters, so
/// `successful_calls - cache_hits - coalesced_calls` equals the sum of
/// vendor successes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    #[serde(flatten)]
    pub calls: FetchStats,
    pub cache_hits: u64,
    /// Calls answered by another caller's in-flight fetch.
    pub coalesced_calls: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorStats {
    pub name: String,
    #[serde(flatten)]
    pub calls: FetchStats,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Point-in-time view of all counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub last_vendor_used: Option<String>,
    pub global: GlobalStats,
    pub vendors: BTreeMap<String, VendorStats>,
}

impl Stats {
    pub fn vendor(&self, name: &str) -> Option<&VendorStats> {
        self.vendors.get(name)
    }

    /// Sum of successful calls over all vendors.
    pub fn vendor_successes(&self) -> u64 {
        self.vendors.values().map(|v| v.calls.successful_calls).sum()
    }
}

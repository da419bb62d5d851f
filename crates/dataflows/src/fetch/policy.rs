//! Caller-owned hooks around the cache.
//!
//! - [`ArgsNormalizer`] rewrites arguments before the cache key is computed
//! - [`CachePolicy`] decides whether a successful result is written

use chrono::{Datelike, NaiveDate, Weekday};
use log::debug;
use serde_json::Value;

use crate::models::FetchArgs;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Decides whether a successful result may be cached.
pub trait CachePolicy: Send + Sync {
    fn should_cache(&self, method: &str, args: &FetchArgs, value: &Value) -> bool;
}

/// Caches every successful result.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysCache;

impl CachePolicy for AlwaysCache {
    fn should_cache(&self, _method: &str, _args: &FetchArgs, _value: &Value) -> bool {
        true
    }
}

/// Skips caching when the requested range ends on a Saturday or Sunday.
///
/// Data ending on a non-trading day is provisional until the next session
/// closes.
#[derive(Clone, Debug)]
pub struct SkipWeekendEndDate {
    methods: Vec<String>,
    end_index: usize,
}

impl SkipWeekendEndDate {
    /// Applies to `methods`, reading the end date from positional index 2.
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
            end_index: 2,
        }
    }

    pub fn end_index(mut self, index: usize) -> Self {
        self.end_index = index;
        self
    }
}

impl CachePolicy for SkipWeekendEndDate {
    fn should_cache(&self, method: &str, args: &FetchArgs, _value: &Value) -> bool {
        if !self.methods.iter().any(|m| m == method) {
            return true;
        }
        let Some(end) = args.str_at(self.end_index).and_then(parse_date) else {
            return true;
        };
        if matches!(end.weekday(), Weekday::Sat | Weekday::Sun) {
            debug!("End date {} of '{}' is a weekend, not caching", end, method);
            return false;
        }
        true
    }
}

/// Rewrites fetch arguments before the cache lookup.
pub trait ArgsNormalizer: Send + Sync {
    fn normalize(&self, method: &str, args: FetchArgs) -> FetchArgs;
}

/// Widens a `[symbol, start, end]` date range to a minimum number of days.
///
/// Requests shorter than `min_days` get their start moved back to
/// `end - min_days`, so indicator windows have enough history and nearby
/// ranges share a cache entry. Unparseable dates are left alone.
#[derive(Clone, Debug)]
pub struct MinimumLookback {
    method: String,
    min_days: i64,
    start_index: usize,
    end_index: usize,
}

impl MinimumLookback {
    pub fn new(method: impl Into<String>, min_days: u32) -> Self {
        Self {
            method: method.into(),
            min_days: i64::from(min_days),
            start_index: 1,
            end_index: 2,
        }
    }
}

impl ArgsNormalizer for MinimumLookback {
    fn normalize(&self, method: &str, mut args: FetchArgs) -> FetchArgs {
        if method != self.method {
            return args;
        }
        let (Some(start), Some(end)) = (
            args.str_at(self.start_index).and_then(parse_date),
            args.str_at(self.end_index).and_then(parse_date),
        ) else {
            return args;
        };

        if (end - start).num_days() < self.min_days {
            let widened = end - chrono::Duration::days(self.min_days);
            debug!("Widening '{}' start date {} -> {}", method, start, widened);
            args.set_at(self.start_index, widened.format(DATE_FORMAT).to_string());
        }
        args
    }
}

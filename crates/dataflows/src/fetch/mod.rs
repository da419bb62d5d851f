//! Fetch orchestration.
//!
//! This module provides:
//! - [`FetchManager`]: Registries, cache, counters and the `fetch` entry point
//! - [`FetchOptions`]: Per-call cache bypass, cancellation token and deadline
//! - [`CachePolicy`] / [`ArgsNormalizer`]: Caller-owned hooks around the cache
//!
//! ```text
//! fetch(method, args)
//!   -> normalize args -> cache (memory, then disk)
//!   -> join or start the in-flight chain for this key
//!        -> vendor 1: attempt loop (backoff, rate-limit waits)
//!        -> vendor 2: ...
//!        -> first success: stats, cache write (if the policy allows)
//!        -> all failed: AllVendorsExhausted
//! ```

mod coalesce;
mod manager;
mod options;
mod policy;

pub use manager::{FetchManager, FetchManagerBuilder};
pub use options::FetchOptions;
pub use policy::{AlwaysCache, ArgsNormalizer, CachePolicy, MinimumLookback, SkipWeekendEndDate};

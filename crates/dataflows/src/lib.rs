//! TradingAgents Dataflows Crate
//!
//! This crate fetches market data (prices, indicators, fundamentals, news)
//! from several interchangeable vendors, any of which may be slow, rate
//! limited or down.
//!
//! # Overview
//!
//! The dataflows crate supports:
//! - Priority-ordered vendor fallback chains per method
//! - Exponential backoff for transient failures, linear backoff for rate limits
//! - A two-tier (memory + JSON file) result cache with TTL
//! - Coalescing of concurrent identical fetches
//! - Cancellation via token or deadline
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |     Caller       | --> |  FetchManager    |  (fetch entry point)
//! +------------------+     +------------------+
//!                            |            |
//!                            v            v
//!                 +-------------+   +------------------+
//!                 |  DataCache  |   |  MethodRegistry  |  (ordered vendors)
//!                 +-------------+   +------------------+
//!                                           |
//!                                           v
//!                                  +------------------+
//!                                  |  Retry engine    |  (per vendor)
//!                                  +------------------+
//!                                           |
//!                                           v
//!                                  +------------------+
//!                                  |    Invoker       |  (vendor adapter)
//!                                  +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`FetchManager`] - Registries, cache and counters behind one handle
//! - [`FetchArgs`] - Positional and keyword arguments of a fetch
//! - [`FetchOptions`] - Cache bypass, cancellation and deadline
//! - [`Invoker`] / [`VendorAdapter`] - The vendor boundary
//! - [`Stats`] - Global and per-vendor counters
//! - [`FetchError`] - Everything a fetch or registration can fail with

pub mod cache;
pub mod config;
pub mod defaults;
pub mod errors;
pub mod fetch;
pub mod invoker;
pub mod models;
pub mod registry;
pub mod retry;

// Re-export all public types from models
pub use models::{
    FetchArgs, FetchStats, GlobalStats, RetryDefaults, Stats, VendorConfig, VendorOptions,
    VendorPriority, VendorStats,
};

// Re-export error types
pub use errors::{
    classify, CacheError, ExhaustionReason, FailureClass, FetchError, VendorError, VendorFailure,
};

// Re-export fetch types
pub use fetch::{
    AlwaysCache, ArgsNormalizer, CachePolicy, FetchManager, FetchManagerBuilder, FetchOptions,
    MinimumLookback, SkipWeekendEndDate,
};

// Re-export invoker types
pub use invoker::{invoker_fn, AdapterInvoker, FnInvoker, Invoker, Operation, VendorAdapter};

pub use cache::{cache_key, CacheStats, DataCache};
pub use config::{CacheConfig, DataflowsConfig};

// Re-exported so callers don't need a direct tokio-util dependency
pub use tokio_util::sync::CancellationToken;

//! Result cache.
//!
//! This module provides:
//! - [`cache_key`]: Content-addressed key of a method call
//! - [`CacheRecord`]: The unit stored in both tiers
//! - [`DataCache`]: Fast in-process tier backed by a durable JSON-file tier
//!
//! Whether a particular result should be cached is decided by the caller,
//! see [`CachePolicy`](crate::fetch::CachePolicy).

mod disk;
mod key;
mod memory;
mod record;
mod store;

pub use key::cache_key;
pub use record::CacheRecord;
pub use store::{CacheStats, DataCache};

//! Dataflows models
//!
//! - `vendor` - Vendor priority, per-vendor options and resolved configuration
//! - `args` - Positional and keyword arguments of a fetch (`FetchArgs`)
//! - `stats` - Read-only statistics snapshots

mod args;
mod stats;
mod vendor;

pub use args::FetchArgs;
pub use stats::{FetchStats, GlobalStats, Stats, VendorStats};
pub use vendor::{RetryDefaults, VendorConfig, VendorOptions, VendorPriority};

//! Vendor and method registries.
//!
//! This module provides:
//! - Vendor registration with retry options and an enabled flag
//! - Method registration mapping an operation name to a vendor chain
//! - Per-vendor and global call counters

mod method_registry;
pub(crate) mod stats;
mod vendor_registry;

pub use method_registry::{MethodRegistration, MethodRegistry};
pub use vendor_registry::VendorRegistry;

//! Vendor registry: per-vendor configuration and runtime state.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{info, warn};

use super::stats::VendorRuntimeState;
use crate::errors::FetchError;
use crate::models::{RetryDefaults, VendorConfig, VendorOptions, VendorPriority, VendorStats};

#[derive(Debug)]
struct VendorEntry {
    config: VendorConfig,
    /// Registration sequence, breaks priority ties.
    seq: usize,
    state: Arc<VendorRuntimeState>,
}

/// Registered vendors.
///
/// Read-mostly: written during startup registration and by
/// [`set_enabled`](Self::set_enabled), read on every fetch.
#[derive(Debug)]
pub struct VendorRegistry {
    vendors: RwLock<HashMap<String, VendorEntry>>,
    defaults: RetryDefaults,
}

impl VendorRegistry {
    pub fn new(defaults: RetryDefaults) -> Self {
        Self {
            vendors: RwLock::new(HashMap::new()),
            defaults,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, VendorEntry>> {
        self.vendors.read().unwrap_or_else(|poisoned| {
            warn!("Vendor registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, VendorEntry>> {
        self.vendors.write().unwrap_or_else(|poisoned| {
            warn!("Vendor registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn defaults(&self) -> &RetryDefaults {
        &self.defaults
    }

    /// Register a vendor. Fails if the name is taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        priority: VendorPriority,
        options: VendorOptions,
    ) -> Result<(), FetchError> {
        let config = VendorConfig::resolve(name, priority, &options, &self.defaults);
        config.validate()?;

        let mut vendors = self.write();
        if vendors.contains_key(&config.name) {
            return Err(FetchError::DuplicateVendor(config.name));
        }

        info!(
            "Registered vendor '{}' ({}, max_retries={}, rate_limit_max_retries={})",
            config.name, config.priority, config.max_retries, config.rate_limit_max_retries
        );
        let seq = vendors.len();
        vendors.insert(
            config.name.clone(),
            VendorEntry {
                config,
                seq,
                state: Arc::new(VendorRuntimeState::default()),
            },
        );
        Ok(())
    }

    /// Pull a vendor in or out of rotation without deregistering it.
    ///
    /// Fetches that already resolved their vendor list are not affected.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), FetchError> {
        let mut vendors = self.write();
        let entry = vendors
            .get_mut(name)
            .ok_or_else(|| FetchError::UnknownVendor(name.to_string()))?;

        if entry.config.enabled != enabled {
            info!(
                "Vendor '{}' {}",
                name,
                if enabled { "enabled" } else { "disabled" }
            );
        }
        entry.config.enabled = enabled;
        Ok(())
    }

    pub fn config(&self, name: &str) -> Option<VendorConfig> {
        self.read().get(name).map(|e| e.config.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.read().get(name).is_some_and(|e| e.config.enabled)
    }

    /// Vendor names in registration order.
    pub fn names(&self) -> Vec<String> {
        let vendors = self.read();
        let mut entries: Vec<_> = vendors.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.config.name.clone()).collect()
    }

    /// Sort key for derived method orders: priority, then registration order.
    pub(crate) fn rank(&self, name: &str) -> Option<(VendorPriority, usize)> {
        self.read().get(name).map(|e| (e.config.priority, e.seq))
    }

    pub(crate) fn state(&self, name: &str) -> Option<Arc<VendorRuntimeState>> {
        self.read().get(name).map(|e| Arc::clone(&e.state))
    }

    pub(crate) fn stats(&self) -> BTreeMap<String, VendorStats> {
        self.read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.state.snapshot(name)))
            .collect()
    }

    pub(crate) fn reset_stats(&self) {
        for entry in self.read().values() {
            entry.state.reset();
        }
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::new(RetryDefaults::default())
    }
}

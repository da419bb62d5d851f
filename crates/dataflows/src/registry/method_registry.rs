//! Method registry: logical operation name -> ordered vendor chain.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use super::VendorRegistry;
use crate::errors::FetchError;
use crate::invoker::Invoker;

/// A registered method.
///
/// Invariant: `order` and the keys of `invokers` name the same vendors.
pub struct MethodRegistration {
    name: String,
    invokers: HashMap<String, Arc<dyn Invoker>>,
    order: Vec<String>,
}

impl MethodRegistration {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vendor order fixed at registration time, including disabled vendors.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn invoker(&self, vendor: &str) -> Option<&Arc<dyn Invoker>> {
        self.invokers.get(vendor)
    }

    /// The order with currently disabled vendors removed.
    pub fn enabled_vendors(&self, vendors: &VendorRegistry) -> Vec<String> {
        self.order
            .iter()
            .filter(|vendor| vendors.is_enabled(vendor))
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for MethodRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistration")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Registered methods.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, Arc<MethodRegistration>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<MethodRegistration>>> {
        self.methods.read().unwrap_or_else(|poisoned| {
            warn!("Method registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<MethodRegistration>>> {
        self.methods.write().unwrap_or_else(|poisoned| {
            warn!("Method registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Register (or replace) a method.
    ///
    /// Without an explicit order, vendors are sorted by priority with ties
    /// broken by vendor registration order. The order is a snapshot: later
    /// vendor changes need a re-registration to take effect.
    pub fn register(
        &self,
        vendors: &VendorRegistry,
        name: impl Into<String>,
        invokers: HashMap<String, Arc<dyn Invoker>>,
        explicit_order: Option<Vec<String>>,
    ) -> Result<(), FetchError> {
        let name = name.into();

        for vendor in invokers.keys() {
            if !vendors.contains(vendor) {
                return Err(FetchError::UnknownVendor(vendor.clone()));
            }
        }

        let order = match explicit_order {
            Some(order) => {
                Self::validate_order(&name, vendors, &invokers, &order)?;
                order
            }
            None => Self::derive_order(vendors, &invokers),
        };

        info!("Registered method '{}' with vendor order {:?}", name, order);
        let registration = MethodRegistration {
            name: name.clone(),
            invokers,
            order,
        };
        if self.write().insert(name, Arc::new(registration)).is_some() {
            debug!("Replaced an existing method registration");
        }
        Ok(())
    }

    fn validate_order(
        method: &str,
        vendors: &VendorRegistry,
        invokers: &HashMap<String, Arc<dyn Invoker>>,
        order: &[String],
    ) -> Result<(), FetchError> {
        let mut seen = HashSet::with_capacity(order.len());
        for vendor in order {
            if !vendors.contains(vendor) {
                return Err(FetchError::UnknownVendor(vendor.clone()));
            }
            if !invokers.contains_key(vendor) {
                return Err(FetchError::MissingImplementation {
                    method: method.to_string(),
                    vendor: vendor.clone(),
                });
            }
            if !seen.insert(vendor.as_str()) {
                return Err(FetchError::DuplicateOrderEntry {
                    method: method.to_string(),
                    vendor: vendor.clone(),
                });
            }
        }

        // An implementation that no order entry reaches is dead configuration.
        let mut unreachable: Vec<_> = invokers
            .keys()
            .filter(|vendor| !seen.contains(vendor.as_str()))
            .collect();
        unreachable.sort();
        if let Some(vendor) = unreachable.first() {
            return Err(FetchError::UnreachableVendor {
                method: method.to_string(),
                vendor: (*vendor).clone(),
            });
        }
        Ok(())
    }

    fn derive_order(
        vendors: &VendorRegistry,
        invokers: &HashMap<String, Arc<dyn Invoker>>,
    ) -> Vec<String> {
        let mut ranked: Vec<_> = invokers
            .keys()
            .filter_map(|vendor| vendors.rank(vendor).map(|rank| (rank, vendor.clone())))
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.into_iter().map(|(_, vendor)| vendor).collect()
    }

    /// Vendors to consult for `name`, skipping disabled ones.
    pub fn ordered_vendors(
        &self,
        vendors: &VendorRegistry,
        name: &str,
    ) -> Result<Vec<String>, FetchError> {
        Ok(self.registration(name)?.enabled_vendors(vendors))
    }

    pub fn registration(&self, name: &str) -> Result<Arc<MethodRegistration>, FetchError> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::UnknownMethod(name.to_string()))
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read().keys().cloned().collect();
        names.sort();
        names
    }
}

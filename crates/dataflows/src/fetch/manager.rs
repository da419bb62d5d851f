use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use log::{debug, info, warn};
use serde_json::Value;

use super::coalesce::{wait, Fetched, InFlight};
use super::policy::{AlwaysCache, ArgsNormalizer, CachePolicy};
use super::FetchOptions;
use crate::cache::{cache_key, DataCache};
use crate::config::{CacheConfig, DataflowsConfig};
use crate::errors::{CacheError, FetchError};
use crate::invoker::Invoker;
use crate::models::{FetchArgs, RetryDefaults, Stats, VendorConfig, VendorOptions, VendorPriority};
use crate::registry::stats::GlobalCounters;
use crate::registry::{MethodRegistration, MethodRegistry, VendorRegistry};
use crate::retry::attempt_vendor;

struct Inner {
    vendors: VendorRegistry,
    methods: MethodRegistry,
    cache: DataCache,
    global: GlobalCounters,
    in_flight: InFlight,
    normalizers: Vec<Arc<dyn ArgsNormalizer>>,
    cache_policy: Arc<dyn CachePolicy>,
}

/// Entry point for all data fetches.
///
/// Construct once at startup, register vendors and methods, then share it:
/// clones are cheap handles onto the same registries, cache and counters.
///
/// # Example
///
/// ```ignore
/// let manager = FetchManager::from_config(&DataflowsConfig::from_env())?;
/// manager.register_vendor("yfinance", VendorPriority::Primary, VendorOptions::new())?;
/// manager.register_method("get_stock_data", impls, None)?;
///
/// let prices = manager
///     .fetch(
///         "get_stock_data",
///         FetchArgs::positional(["AAPL", "2024-01-01", "2024-01-31"]),
///         FetchOptions::new(),
///     )
///     .await?;
/// ```
#[derive(Clone)]
pub struct FetchManager {
    inner: Arc<Inner>,
}

impl FetchManager {
    pub fn builder() -> FetchManagerBuilder {
        FetchManagerBuilder::default()
    }

    /// Manager with default hooks built from `config`.
    pub fn from_config(config: &DataflowsConfig) -> Result<Self, CacheError> {
        Self::builder()
            .retry_defaults(config.retry.clone())
            .cache_config(config.cache.clone())
            .build()
    }

    /// Register a vendor. Unset options fall back to the manager's retry defaults.
    pub fn register_vendor(
        &self,
        name: impl Into<String>,
        priority: VendorPriority,
        options: VendorOptions,
    ) -> Result<(), FetchError> {
        self.inner.vendors.register(name, priority, options)
    }

    /// Register (or replace) a method and its per-vendor invokers.
    ///
    /// Without `order`, vendors are consulted by priority, ties broken by
    /// vendor registration order.
    pub fn register_method(
        &self,
        name: impl Into<String>,
        invokers: HashMap<String, Arc<dyn Invoker>>,
        order: Option<Vec<String>>,
    ) -> Result<(), FetchError> {
        self.inner
            .methods
            .register(&self.inner.vendors, name, invokers, order)
    }

    pub fn set_vendor_enabled(&self, name: &str, enabled: bool) -> Result<(), FetchError> {
        self.inner.vendors.set_enabled(name, enabled)
    }

    pub fn vendor_config(&self, name: &str) -> Option<VendorConfig> {
        self.inner.vendors.config(name)
    }

    pub fn vendor_names(&self) -> Vec<String> {
        self.inner.vendors.names()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.inner.methods.method_names()
    }

    /// Enabled vendors for `method`, in the order they would be tried.
    pub fn ordered_vendors(&self, method: &str) -> Result<Vec<String>, FetchError> {
        self.inner.methods.ordered_vendors(&self.inner.vendors, method)
    }

    pub fn cache(&self) -> &DataCache {
        &self.inner.cache
    }

    /// Fetch `method(args)`.
    ///
    /// Serves a fresh cached result if there is one, otherwise walks the
    /// method's vendors in order until one succeeds. Concurrent calls with the
    /// same arguments share a single vendor chain.
    ///
    /// # Errors
    ///
    /// - [`FetchError::UnknownMethod`] / [`FetchError::NoVendorAvailable`]
    ///   for configuration problems, before any vendor is called
    /// - [`FetchError::AllVendorsExhausted`] when every vendor failed
    /// - [`FetchError::Cancelled`] when the token or deadline fired first
    pub async fn fetch(
        &self,
        method: &str,
        args: FetchArgs,
        options: FetchOptions,
    ) -> Result<Value, FetchError> {
        if options.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let inner = &self.inner;
        let args = inner.normalize(method, args);
        let key = cache_key(method, &args);

        if !options.no_cache {
            if let Some(value) = inner.cache.load(&key).await {
                inner.global.counters.record_call();
                inner.global.counters.record_success();
                inner.global.record_cache_hit();
                debug!("Serving '{}' from cache", method);
                return Ok(value);
            }
        }

        let registration = inner.methods.registration(method)?;
        let vendors = registration.enabled_vendors(&inner.vendors);
        if vendors.is_empty() {
            warn!("No enabled vendor for method '{}'", method);
            return Err(FetchError::NoVendorAvailable {
                method: method.to_string(),
            });
        }

        inner.global.counters.record_call();

        // Cache-bypassing calls must not be answered by a chain that will
        // write the cache, and vice versa.
        let flight_key = if options.no_cache {
            format!("{}:nocache", key)
        } else {
            key.clone()
        };

        let (chain, claim) = inner.in_flight.join_or_start(&flight_key, |generation| {
            let inner = Arc::clone(&self.inner);
            let method = method.to_string();
            let flight_key = flight_key.clone();
            let no_cache = options.no_cache;
            async move {
                let result = inner
                    .run_chain(&method, &args, &key, &registration, vendors, no_cache)
                    .await;
                inner.in_flight.complete(&flight_key, generation);
                result
            }
            .boxed()
        });
        if !claim.is_leader() {
            debug!("Joining in-flight fetch for '{}'", method);
        }

        let result = wait(chain, &options).await;
        inner.in_flight.prune(&flight_key);

        // Each caller records what it received. A vendor result is counted
        // once as a vendor success, every other receiver counts it as coalesced.
        match result {
            Ok(Fetched { value, from_cache }) => {
                inner.global.counters.record_success();
                if from_cache {
                    inner.global.record_cache_hit();
                } else if !claim.take() {
                    inner.global.record_coalesced();
                }
                Ok(value)
            }
            Err(FetchError::Cancelled) => {
                info!("Fetch of '{}' cancelled", method);
                Err(FetchError::Cancelled)
            }
            Err(error) => {
                inner.global.counters.record_failure();
                Err(error)
            }
        }
    }

    /// Point-in-time copy of all counters.
    pub fn stats(&self) -> Stats {
        Stats {
            last_vendor_used: self.inner.global.last_vendor_used(),
            global: self.inner.global.snapshot(),
            vendors: self.inner.vendors.stats(),
        }
    }

    /// Zero every counter, global and per vendor.
    pub fn reset_stats(&self) {
        self.inner.global.reset();
        self.inner.vendors.reset_stats();
        info!("Fetch statistics reset");
    }
}

impl Inner {
    fn normalize(&self, method: &str, args: FetchArgs) -> FetchArgs {
        self.normalizers
            .iter()
            .fold(args, |args, normalizer| normalizer.normalize(method, args))
    }

    /// Try `vendors` in order. Records per-vendor stats only: the callers
    /// sharing the chain each record their own outcome.
    async fn run_chain(
        &self,
        method: &str,
        args: &FetchArgs,
        key: &str,
        registration: &MethodRegistration,
        vendors: Vec<String>,
        no_cache: bool,
    ) -> Result<Fetched, FetchError> {
        // A chain for this key may have filled the cache since the caller's lookup
        if !no_cache {
            if let Some(value) = self.cache.load(key).await {
                debug!("'{}' was cached while starting a fetch", method);
                return Ok(Fetched::cached(value));
            }
        }

        let mut failures = Vec::with_capacity(vendors.len());

        for vendor in vendors {
            let (Some(invoker), Some(config), Some(state)) = (
                registration.invoker(&vendor),
                self.vendors.config(&vendor),
                self.vendors.state(&vendor),
            ) else {
                warn!("Vendor '{}' vanished from method '{}', skipping", vendor, method);
                continue;
            };

            debug!("Trying vendor '{}' for '{}'", vendor, method);
            match attempt_vendor(&config, invoker.as_ref(), args, &state, &self.global.counters)
                .await
            {
                Ok(value) => {
                    self.global.set_last_vendor_used(&vendor);
                    info!("Fetched '{}' from vendor '{}'", method, vendor);

                    if !no_cache && self.cache_policy.should_cache(method, args, &value) {
                        self.cache.store(key, method, value.clone()).await;
                    }
                    return Ok(Fetched::vendor(value));
                }
                Err(failure) => {
                    warn!("Vendor '{}' failed for '{}': {}", vendor, method, failure);
                    failures.push(failure);
                }
            }
        }

        let error = FetchError::AllVendorsExhausted {
            method: method.to_string(),
            failures,
        };
        warn!("{}", error);
        Err(error)
    }
}

/// Builder for [`FetchManager`].
pub struct FetchManagerBuilder {
    retry: RetryDefaults,
    cache_config: CacheConfig,
    cache: Option<DataCache>,
    cache_policy: Arc<dyn CachePolicy>,
    normalizers: Vec<Arc<dyn ArgsNormalizer>>,
}

impl Default for FetchManagerBuilder {
    fn default() -> Self {
        Self {
            retry: RetryDefaults::default(),
            cache_config: CacheConfig::default(),
            cache: None,
            cache_policy: Arc::new(AlwaysCache),
            normalizers: Vec::new(),
        }
    }
}

impl FetchManagerBuilder {
    /// Defaults for vendor options left unset at registration.
    pub fn retry_defaults(mut self, retry: RetryDefaults) -> Self {
        self.retry = retry;
        self
    }

    /// Open the cache from `config` at build time.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Use an already opened cache. Takes precedence over `cache_config`.
    pub fn cache(mut self, cache: DataCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_policy(mut self, policy: impl CachePolicy + 'static) -> Self {
        self.cache_policy = Arc::new(policy);
        self
    }

    /// Add an argument normalizer. Normalizers run in insertion order.
    pub fn normalizer(mut self, normalizer: impl ArgsNormalizer + 'static) -> Self {
        self.normalizers.push(Arc::new(normalizer));
        self
    }

    pub fn build(self) -> Result<FetchManager, CacheError> {
        let cache = match self.cache {
            Some(cache) => cache,
            None => DataCache::new(self.cache_config)?,
        };

        Ok(FetchManager {
            inner: Arc::new(Inner {
                vendors: VendorRegistry::new(self.retry),
                methods: MethodRegistry::new(),
                cache,
                global: GlobalCounters::default(),
                in_flight: InFlight::default(),
                normalizers: self.normalizers,
                cache_policy: self.cache_policy,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VendorError;
    use crate::invoker::invoker_fn;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const METHOD: &str = "get_news";

    fn manager_with_vendor(dir: &TempDir) -> (FetchManager, Arc<AtomicUsize>) {
        let manager = FetchManager::builder()
            .cache_config(CacheConfig::new(dir.path()))
            .build()
            .unwrap();
        manager
            .register_vendor("yfinance", VendorPriority::Primary, VendorOptions::new())
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let invoker = invoker_fn(move |_args: FetchArgs| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, VendorError>(json!(["from vendor"])) }
        });
        let invokers = HashMap::from([("yfinance".to_string(), invoker)]);
        manager.register_method(METHOD, invokers, None).unwrap();
        (manager, calls)
    }

    async fn run_chain(manager: &FetchManager, args: &FetchArgs, no_cache: bool) -> Fetched {
        let inner = &manager.inner;
        let registration = inner.methods.registration(METHOD).unwrap();
        let vendors = registration.enabled_vendors(&inner.vendors);
        inner
            .run_chain(METHOD, args, &cache_key(METHOD, args), &registration, vendors, no_cache)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_chain_rechecks_cache_before_vendors() {
        let dir = TempDir::new().unwrap();
        let (manager, calls) = manager_with_vendor(&dir);
        let args = FetchArgs::positional(["AAPL"]);

        // Filled by another chain after this caller's own lookup missed
        manager.cache().set(METHOD, &json!(["cached"]), &args);

        let fetched = run_chain(&manager, &args, false).await;
        assert_eq!(fetched, Fetched::cached(json!(["cached"])));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.stats().vendor_successes(), 0);
    }

    #[tokio::test]
    async fn test_no_cache_chain_skips_recheck() {
        let dir = TempDir::new().unwrap();
        let (manager, calls) = manager_with_vendor(&dir);
        let args = FetchArgs::positional(["AAPL"]);
        manager.cache().set(METHOD, &json!(["cached"]), &args);

        let fetched = run_chain(&manager, &args, true).await;
        assert_eq!(fetched, Fetched::vendor(json!(["from vendor"])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.stats().last_vendor_used.as_deref(), Some("yfinance"));
    }
}

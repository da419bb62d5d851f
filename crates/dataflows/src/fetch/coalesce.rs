//! In-flight request coalescing.
//!
//! Concurrent fetches for the same key share one vendor chain. The map only
//! holds weak handles: the chain lives as long as at least one caller is
//! still waiting on it, and is dropped (cancelling the vendor call or backoff
//! sleep in progress) when the last one gives up.

use std::collections::HashMap;
use std::future::{self, Future};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use log::warn;
use serde_json::Value;

use super::FetchOptions;
use crate::errors::FetchError;

/// Result of a chain, and whether it was found in the cache instead of
/// fetched from a vendor.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Fetched {
    pub value: Value,
    pub from_cache: bool,
}

impl Fetched {
    pub fn vendor(value: Value) -> Self {
        Self { value, from_cache: false }
    }

    pub fn cached(value: Value) -> Self {
        Self { value, from_cache: true }
    }
}

pub(crate) type ChainFuture = BoxFuture<'static, Result<Fetched, FetchError>>;
pub(crate) type SharedChain = Shared<ChainFuture>;

struct Flight {
    generation: u64,
    chain: WeakShared<ChainFuture>,
    claimed: Arc<AtomicBool>,
}

/// A caller's stake in a chain.
pub(crate) struct Claim {
    leader: bool,
    claimed: Arc<AtomicBool>,
}

impl Claim {
    /// Whether this caller started the chain.
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// True for exactly one of the callers sharing a chain: the first to
    /// take its result. Cancelled callers never take it.
    pub fn take(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }
}

#[derive(Default)]
pub(crate) struct InFlight {
    flights: Mutex<HashMap<String, Flight>>,
    next_generation: AtomicU64,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Flight>> {
        self.flights.lock().unwrap_or_else(|poisoned| {
            warn!("In-flight map mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Join the live chain for `key`, or start one with `start`.
    ///
    /// `start` receives the generation to hand back to
    /// [`complete`](Self::complete). Returns the chain and this caller's
    /// claim on its result.
    pub fn join_or_start<F>(&self, key: &str, start: F) -> (SharedChain, Claim)
    where
        F: FnOnce(u64) -> ChainFuture,
    {
        let mut flights = self.lock();
        if let Some(flight) = flights.get(key) {
            if let Some(chain) = flight.chain.upgrade() {
                let claim = Claim {
                    leader: false,
                    claimed: Arc::clone(&flight.claimed),
                };
                return (chain, claim);
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let chain = start(generation).shared();
        let claimed = Arc::new(AtomicBool::new(false));
        match chain.downgrade() {
            Some(weak) => {
                let flight = Flight {
                    generation,
                    chain: weak,
                    claimed: Arc::clone(&claimed),
                };
                flights.insert(key.to_string(), flight);
            }
            None => {
                flights.remove(key);
            }
        }
        (chain, Claim { leader: true, claimed })
    }

    /// Called by a chain when it finishes, so later fetches start fresh
    /// instead of reusing its result.
    pub fn complete(&self, key: &str, generation: u64) {
        let mut flights = self.lock();
        if flights.get(key).is_some_and(|flight| flight.generation == generation) {
            flights.remove(key);
        }
    }

    /// Drop the entry for `key` if nobody is waiting on it anymore.
    pub fn prune(&self, key: &str) {
        let mut flights = self.lock();
        if flights.get(key).is_some_and(|flight| flight.chain.upgrade().is_none()) {
            flights.remove(key);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Wait for `chain`, giving up when the caller's token or deadline fires.
pub(crate) async fn wait(
    chain: SharedChain,
    options: &FetchOptions,
) -> Result<Fetched, FetchError> {
    let cancelled = optional(
        options
            .cancel
            .as_ref()
            .map(|token| token.cancelled()),
    );
    let expired = optional(options.deadline.map(tokio::time::sleep_until));

    tokio::select! {
        biased;
        _ = cancelled => Err(FetchError::Cancelled),
        _ = expired => Err(FetchError::Cancelled),
        result = chain => result,
    }
}

/// Resolves with `fut`, or never when there is none.
async fn optional<F: Future<Output = ()>>(fut: Option<F>) {
    match fut {
        Some(fut) => fut.await,
        None => future::pending().await,
    }
}

//! Per-vendor attempt loop.

use std::time::Duration;

use log::{debug, info};
use serde_json::Value;
use tokio::time::Instant;

use super::backoff::{jittered_delay, rate_limit_delay};
use crate::errors::{ExhaustionReason, FailureClass, VendorError, VendorFailure};
use crate::invoker::Invoker;
use crate::models::{FetchArgs, VendorConfig};
use crate::registry::stats::{StatsCounters, VendorRuntimeState};

/// Drive the attempt loop for one vendor within one fetch.
///
/// - Success returns immediately, without further attempts or delay.
/// - Generic failures back off exponentially with jitter and consume one of
///   `max_retries` attempts.
/// - Rate-limit failures wait `rate_limit_wait * n` (or the vendor's
///   `retry_after`, whichever is longer) and don't consume a generic attempt.
///   The vendor is abandoned once `n` exceeds `rate_limit_max_retries`.
///
/// Per-attempt failures never escape: the caller only sees the value or a
/// [`VendorFailure`] summarizing the last error. Dropping the returned future
/// cancels the in-progress call or sleep.
pub(crate) async fn attempt_vendor(
    config: &VendorConfig,
    invoker: &dyn Invoker,
    args: &FetchArgs,
    vendor: &VendorRuntimeState,
    global: &StatsCounters,
) -> Result<Value, VendorFailure> {
    let mut attempt: u32 = 0;
    let mut rate_limit_retries: u32 = 0;
    let mut invocations: u32 = 0;

    loop {
        vendor.counters.record_call();
        invocations += 1;

        let error = match invoker.invoke(args).await {
            Ok(value) => {
                vendor.record_success();
                debug!(
                    "Vendor '{}' succeeded after {} invocation(s)",
                    config.name, invocations
                );
                return Ok(value);
            }
            Err(error) => error,
        };

        vendor.record_failure(&error);

        match error.failure_class() {
            FailureClass::RateLimit => {
                vendor.counters.record_rate_limit_hit();
                global.record_rate_limit_hit();
                rate_limit_retries += 1;

                if rate_limit_retries > config.rate_limit_max_retries {
                    info!(
                        "Vendor '{}' still rate limited after {} wait(s), abandoning",
                        config.name, config.rate_limit_max_retries
                    );
                    return Err(exhausted(
                        config,
                        invocations,
                        ExhaustionReason::RateLimitExhausted,
                        error,
                    ));
                }

                let wait = rate_limit_delay(config.rate_limit_wait, rate_limit_retries)
                    .max(error.retry_after().unwrap_or(Duration::ZERO));
                debug!(
                    "Vendor '{}' rate limited ({}/{}), waiting {:?}",
                    config.name, rate_limit_retries, config.rate_limit_max_retries, wait
                );
                pause(wait, vendor, global).await;
            }
            FailureClass::Generic if attempt + 1 < config.max_retries => {
                let delay = jittered_delay(
                    attempt,
                    config.retry_delay_base,
                    config.retry_delay_max,
                    &mut rand::thread_rng(),
                );
                debug!(
                    "Vendor '{}' failed attempt {}/{}: {}, retrying in {:?}",
                    config.name,
                    attempt + 1,
                    config.max_retries,
                    error,
                    delay
                );
                attempt += 1;
                pause(delay, vendor, global).await;
            }
            FailureClass::Generic => {
                debug!(
                    "Vendor '{}' failed final attempt {}/{}: {}",
                    config.name,
                    attempt + 1,
                    config.max_retries,
                    error
                );
                return Err(exhausted(
                    config,
                    invocations,
                    ExhaustionReason::RetriesExhausted,
                    error,
                ));
            }
        }
    }
}

/// Sleep for `wait`, adding the time actually slept to both wait counters.
/// A sleep cut short by cancellation only counts up to the cancellation.
async fn pause(wait: Duration, vendor: &VendorRuntimeState, global: &StatsCounters) {
    let _recorder = WaitRecorder {
        started: Instant::now(),
        limit: wait,
        vendor,
        global,
    };
    tokio::time::sleep(wait).await;
}

struct WaitRecorder<'a> {
    started: Instant,
    limit: Duration,
    vendor: &'a VendorRuntimeState,
    global: &'a StatsCounters,
}

impl Drop for WaitRecorder<'_> {
    fn drop(&mut self) {
        let waited = self.started.elapsed().min(self.limit);
        self.vendor.counters.record_wait(waited);
        self.global.record_wait(waited);
    }
}

fn exhausted(
    config: &VendorConfig,
    attempts: u32,
    reason: ExhaustionReason,
    last_error: VendorError,
) -> VendorFailure {
    VendorFailure {
        vendor: config.name.clone(),
        attempts,
        reason,
        last_error,
    }
}

//! Retry and backoff.
//!
//! Generic failures back off exponentially with jitter, capped at the
//! vendor's `retry_delay_max`. Rate-limit failures back off linearly and have
//! their own budget. Sleeps are tokio timers, so a dropped fetch stops
//! waiting immediately.

pub mod backoff;
mod engine;

pub(crate) use engine::attempt_vendor;

//! Error types and failure classification for the dataflows crate.
//!
//! This module provides:
//! - [`VendorError`]: What a single vendor call returns on failure
//! - [`FetchError`]: The error crossing the `fetch` boundary and every registry operation
//! - [`CacheError`]: Failures of the durable cache tier
//! - [`FailureClass`]: Rate-limit vs generic classification driving the retry engine

mod retry;

pub use retry::{classify, FailureClass, RATE_LIMIT_KEYWORDS};

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by a single vendor invocation.
///
/// Adapters that can be changed should return [`VendorError::RateLimited`] when
/// the provider throttles them. Everything else is classified by message text,
/// see [`classify`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VendorError {
    /// The vendor throttled the request.
    #[error("Rate limited: {vendor}")]
    RateLimited {
        /// The vendor that rate limited the request
        vendor: String,
        /// Wait hint supplied by the vendor, if any
        retry_after: Option<Duration>,
    },

    /// The vendor answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The request to the vendor timed out.
    #[error("Timeout: {vendor}")]
    Timeout {
        /// The vendor that timed out
        vendor: String,
    },

    /// The vendor has no implementation for the requested operation.
    #[error("Operation '{operation}' not supported by {vendor}")]
    NotSupported {
        /// Operation name, e.g. `get_news`
        operation: String,
        /// The vendor lacking the operation
        vendor: String,
    },

    /// Any other failure reported by an adapter.
    #[error("{0}")]
    Other(String),
}

impl VendorError {
    /// Wrap an arbitrary adapter failure.
    pub fn other(message: impl fmt::Display) -> Self {
        Self::Other(message.to_string())
    }

    /// Structured rate-limit error without a wait hint.
    pub fn rate_limited(vendor: impl Into<String>) -> Self {
        Self::RateLimited {
            vendor: vendor.into(),
            retry_after: None,
        }
    }

    /// Returns the failure class for this error.
    pub fn failure_class(&self) -> FailureClass {
        classify(self)
    }

    /// Wait hint carried by a structured rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Why a vendor was abandoned during a fetch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExhaustionReason {
    /// Every generic retry slot was used.
    RetriesExhausted,
    /// More rate-limit responses than `rate_limit_max_retries` allows.
    RateLimitExhausted,
}

impl fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted => write!(f, "retries exhausted"),
            Self::RateLimitExhausted => write!(f, "rate limit exhausted"),
        }
    }
}

/// Final outcome of one vendor that failed every attempt within a fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct VendorFailure {
    pub vendor: String,
    /// Number of times the vendor was invoked.
    pub attempts: u32,
    pub reason: ExhaustionReason,
    /// The last error the vendor returned.
    pub last_error: VendorError,
}

impl fmt::Display for VendorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} after {} attempt(s) ({})",
            self.vendor, self.reason, self.attempts, self.last_error
        )
    }
}

fn summarize(failures: &[VendorFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors produced by registration and by [`FetchManager::fetch`](crate::FetchManager::fetch).
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// A vendor with this name is already registered.
    #[error("Vendor already registered: {0}")]
    DuplicateVendor(String),

    /// The vendor was never registered.
    #[error("Unknown vendor: {0}")]
    UnknownVendor(String),

    /// Vendor options are unusable, e.g. zero retries.
    #[error("Invalid configuration for vendor '{vendor}': {reason}")]
    InvalidVendorConfig { vendor: String, reason: String },

    /// The method was never registered.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The explicit vendor order names a vendor without an implementation.
    #[error("Method '{method}' lists vendor '{vendor}' without an implementation")]
    MissingImplementation { method: String, vendor: String },

    /// An implementation is registered for a vendor missing from the explicit order.
    #[error("Method '{method}' has an implementation for '{vendor}' that is not in its vendor order")]
    UnreachableVendor { method: String, vendor: String },

    /// The explicit vendor order lists the same vendor twice.
    #[error("Method '{method}' lists vendor '{vendor}' more than once")]
    DuplicateOrderEntry { method: String, vendor: String },

    /// The method has no registered and enabled vendor.
    /// This is a configuration error and should not be retried by the caller.
    #[error("No vendors available for method '{method}'")]
    NoVendorAvailable { method: String },

    /// Every vendor in the chain was tried and all of them failed.
    #[error("All vendors failed for method '{method}': {}", summarize(.failures))]
    AllVendorsExhausted {
        method: String,
        /// Per-vendor final errors, in the order the vendors were consulted.
        failures: Vec<VendorFailure>,
    },

    /// The caller's cancellation token or deadline fired.
    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// The most recent vendor error, if any vendor was consulted.
    pub fn last_vendor_error(&self) -> Option<&VendorError> {
        match self {
            Self::AllVendorsExhausted { failures, .. } => failures.last().map(|f| &f.last_error),
            _ => None,
        }
    }

    /// Returns true for misconfiguration errors that retrying cannot fix.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::AllVendorsExhausted { .. } | Self::Cancelled)
    }
}

/// Errors raised by the durable cache tier.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("Cache I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(vendor: &str, error: VendorError) -> VendorFailure {
        VendorFailure {
            vendor: vendor.to_string(),
            attempts: 3,
            reason: ExhaustionReason::RetriesExhausted,
            last_error: error,
        }
    }

    #[test]
    fn test_vendor_error_display() {
        let error = VendorError::rate_limited("yfinance");
        assert_eq!(format!("{}", error), "Rate limited: yfinance");

        let error = VendorError::Http {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(format!("{}", error), "HTTP 503: Service Unavailable");

        let error = VendorError::NotSupported {
            operation: "get_news".to_string(),
            vendor: "longbridge".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Operation 'get_news' not supported by longbridge"
        );
    }

    #[test]
    fn test_retry_after_only_on_rate_limited() {
        let error = VendorError::RateLimited {
            vendor: "alpha_vantage".to_string(),
            retry_after: Some(Duration::from_secs(12)),
        };
        assert_eq!(error.retry_after(), Some(Duration::from_secs(12)));
        assert_eq!(VendorError::other("boom").retry_after(), None);
    }

    #[test]
    fn test_exhausted_display_chains_vendors() {
        let error = FetchError::AllVendorsExhausted {
            method: "get_stock_data".to_string(),
            failures: vec![
                failure("longbridge", VendorError::other("connection reset")),
                failure(
                    "yfinance",
                    VendorError::Timeout {
                        vendor: "yfinance".to_string(),
                    },
                ),
            ],
        };

        let message = error.to_string();
        assert!(message.starts_with("All vendors failed for method 'get_stock_data'"));
        assert!(message.contains("longbridge: retries exhausted after 3 attempt(s) (connection reset)"));
        assert!(message.contains(" -> yfinance"));
    }

    #[test]
    fn test_last_vendor_error() {
        let error = FetchError::AllVendorsExhausted {
            method: "get_news".to_string(),
            failures: vec![
                failure("a", VendorError::other("first")),
                failure("b", VendorError::other("second")),
            ],
        };
        assert_eq!(error.last_vendor_error(), Some(&VendorError::other("second")));
        assert_eq!(FetchError::Cancelled.last_vendor_error(), None);
    }

    #[test]
    fn test_configuration_errors() {
        assert!(FetchError::NoVendorAvailable {
            method: "get_news".to_string()
        }
        .is_configuration_error());
        assert!(FetchError::UnknownMethod("nope".to_string()).is_configuration_error());
        assert!(!FetchError::Cancelled.is_configuration_error());
        assert!(!FetchError::AllVendorsExhausted {
            method: "m".to_string(),
            failures: Vec::new(),
        }
        .is_configuration_error());
    }
}

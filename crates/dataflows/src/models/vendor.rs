use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

/// Vendor priority used to derive a method's fallback chain.
///
/// Lower rank is consulted first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorPriority {
    Primary = 1,
    #[default]
    Secondary = 2,
    Fallback = 3,
}

impl VendorPriority {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for VendorPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Default retry settings applied to vendors that don't override them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryDefaults {
    pub max_retries: u32,
    pub retry_delay_base: Duration,
    pub retry_delay_max: Duration,
    pub rate_limit_wait: Duration,
    pub rate_limit_max_retries: u32,
}

impl Default for RetryDefaults {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_base: Duration::from_secs(1),
            retry_delay_max: Duration::from_secs(10),
            rate_limit_wait: Duration::from_secs(5),
            rate_limit_max_retries: 5,
        }
    }
}

/// Per-vendor overrides supplied at registration.
///
/// Unset fields fall back to the manager's [`RetryDefaults`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorOptions {
    pub max_retries: Option<u32>,
    pub retry_delay_base: Option<Duration>,
    pub retry_delay_max: Option<Duration>,
    pub rate_limit_wait: Option<Duration>,
    pub rate_limit_max_retries: Option<u32>,
    pub enabled: Option<bool>,
}

impl VendorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, value: u32) -> Self {
        self.max_retries = Some(value);
        self
    }

    pub fn retry_delay_base(mut self, value: Duration) -> Self {
        self.retry_delay_base = Some(value);
        self
    }

    pub fn retry_delay_max(mut self, value: Duration) -> Self {
        self.retry_delay_max = Some(value);
        self
    }

    pub fn rate_limit_wait(mut self, value: Duration) -> Self {
        self.rate_limit_wait = Some(value);
        self
    }

    pub fn rate_limit_max_retries(mut self, value: u32) -> Self {
        self.rate_limit_max_retries = Some(value);
        self
    }

    pub fn enabled(mut self, value: bool) -> Self {
        self.enabled = Some(value);
        self
    }
}

/// Resolved vendor configuration.
///
/// Immutable after registration except `enabled`, which the registry toggles
/// in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorConfig {
    pub name: String,
    pub priority: VendorPriority,
    /// Generic attempts per fetch, including the first one.
    pub max_retries: u32,
    pub retry_delay_base: Duration,
    pub retry_delay_max: Duration,
    pub rate_limit_wait: Duration,
    pub rate_limit_max_retries: u32,
    pub enabled: bool,
}

impl VendorConfig {
    /// Merge options over defaults.
    pub fn resolve(
        name: impl Into<String>,
        priority: VendorPriority,
        options: &VendorOptions,
        defaults: &RetryDefaults,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            max_retries: options.max_retries.unwrap_or(defaults.max_retries),
            retry_delay_base: options
                .retry_delay_base
                .unwrap_or(defaults.retry_delay_base),
            retry_delay_max: options.retry_delay_max.unwrap_or(defaults.retry_delay_max),
            rate_limit_wait: options.rate_limit_wait.unwrap_or(defaults.rate_limit_wait),
            rate_limit_max_retries: options
                .rate_limit_max_retries
                .unwrap_or(defaults.rate_limit_max_retries),
            enabled: options.enabled.unwrap_or(true),
        }
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if self.name.trim().is_empty() {
            return Err(FetchError::InvalidVendorConfig {
                vendor: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.max_retries == 0 {
            return Err(FetchError::InvalidVendorConfig {
                vendor: self.name.clone(),
                reason: "max_retries must be at least 1".to_string(),
            });
        }
        if self.retry_delay_max < self.retry_delay_base {
            return Err(FetchError::InvalidVendorConfig {
                vendor: self.name.clone(),
                reason: "retry_delay_max must not be below retry_delay_base".to_string(),
            });
        }
        Ok(())
    }
}

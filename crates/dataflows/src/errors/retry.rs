use super::VendorError;

/// Keywords that mark a failure message as a rate-limit condition.
///
/// Matched case-insensitively against the error's display text.
pub const RATE_LIMIT_KEYWORDS: &[&str] = &[
    "rate limit",
    "ratelimit",
    "too many requests",
    "429",
    "quota",
    "exceeded",
    "throttle",
];

/// Classification for retry policy.
///
/// | Class | Backoff | Budget |
/// |-------|---------|--------|
/// | `RateLimit` | linear, `rate_limit_wait * n` | `rate_limit_max_retries` |
/// | `Generic` | exponential with jitter, capped at `retry_delay_max` | `max_retries` |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureClass {
    /// The vendor is throttling us.
    RateLimit,
    /// Any other transient failure.
    Generic,
}

/// Classify a vendor failure.
///
/// A structured marker wins: [`VendorError::RateLimited`] and HTTP 429 are
/// always rate limits. Otherwise the message text is scanned for
/// [`RATE_LIMIT_KEYWORDS`], which covers third-party adapters that only
/// report strings. The classifier never looks at which vendor failed.
pub fn classify(error: &VendorError) -> FailureClass {
    match error {
        VendorError::RateLimited { .. } | VendorError::Http { status: 429, .. } => {
            return FailureClass::RateLimit;
        }
        _ => {}
    }

    let message = error.to_string().to_lowercase();
    if RATE_LIMIT_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
    {
        FailureClass::RateLimit
    } else {
        FailureClass::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_structured_rate_limit() {
        let error = VendorError::RateLimited {
            vendor: "longbridge".to_string(),
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(classify(&error), FailureClass::RateLimit);
    }

    #[test]
    fn test_http_429_is_rate_limit() {
        let error = VendorError::Http {
            status: 429,
            message: String::new(),
        };
        assert_eq!(classify(&error), FailureClass::RateLimit);
    }

    #[test]
    fn test_keyword_heuristic_is_case_insensitive() {
        for message in [
            "Rate Limit reached",
            "API RATELIMIT",
            "Too Many Requests",
            "server said 429",
            "Daily quota used up",
            "Request limit EXCEEDED",
            "Throttled by upstream",
        ] {
            assert_eq!(
                classify(&VendorError::other(message)),
                FailureClass::RateLimit,
                "{message}"
            );
        }
    }

    #[test]
    fn test_generic_failures() {
        assert_eq!(
            classify(&VendorError::other("connection reset by peer")),
            FailureClass::Generic
        );
        assert_eq!(
            classify(&VendorError::Http {
                status: 503,
                message: "Service Unavailable".to_string(),
            }),
            FailureClass::Generic
        );
        assert_eq!(
            classify(&VendorError::Timeout {
                vendor: "yfinance".to_string(),
            }),
            FailureClass::Generic
        );
    }

    #[test]
    fn test_not_supported_is_generic() {
        let error = VendorError::NotSupported {
            operation: "get_candlestick_patterns".to_string(),
            vendor: "yfinance".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Generic);
    }
}

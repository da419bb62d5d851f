//! Vendor invocation trait definitions.
//!
//! Two layers exist:
//! - [`Invoker`] is what a method registration stores per vendor: one call,
//!   one result.
//! - [`VendorAdapter`] is what a data-provider integration implements: one
//!   method per operation family. [`AdapterInvoker`](super::AdapterInvoker)
//!   binds an adapter to an [`Operation`](super::Operation).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::VendorError;
use crate::models::FetchArgs;

use super::Operation;

/// A single callable that performs one vendor request.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Perform the request.
    ///
    /// Return [`VendorError::RateLimited`] when the vendor throttles the
    /// request so the retry engine can apply the linear rate-limit backoff.
    async fn invoke(&self, args: &FetchArgs) -> Result<Value, VendorError>;
}

/// Trait for market data vendor integrations.
///
/// Implement the operation families the vendor supports; the rest answer
/// [`VendorError::NotSupported`], which the fetch chain treats as a generic
/// failure and falls through to the next vendor.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use tradingagents_dataflows::{FetchArgs, VendorAdapter, VendorError};
///
/// struct LongbridgeAdapter {
///     client: LongbridgeClient,
/// }
///
/// #[async_trait]
/// impl VendorAdapter for LongbridgeAdapter {
///     fn id(&self) -> &'static str {
///         "longbridge"
///     }
///
///     async fn get_stock_data(&self, args: &FetchArgs) -> Result<Value, VendorError> {
///         // ... call the SDK, map errors to VendorError
///     }
/// }
/// ```
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    /// Vendor name as registered with the manager, e.g. "yfinance".
    fn id(&self) -> &'static str;

    /// OHLCV price history: `[symbol, start_date, end_date]`.
    async fn get_stock_data(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::StockData))
    }

    /// Technical indicator series: `[symbol, indicator, curr_date, look_back_days]`.
    async fn get_indicators(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::Indicators))
    }

    async fn get_fundamentals(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::Fundamentals))
    }

    async fn get_balance_sheet(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::BalanceSheet))
    }

    async fn get_cashflow(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::Cashflow))
    }

    async fn get_income_statement(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::IncomeStatement))
    }

    async fn get_news(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::News))
    }

    async fn get_global_news(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::GlobalNews))
    }

    async fn get_insider_transactions(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::InsiderTransactions))
    }

    async fn get_candlestick_patterns(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let _ = args;
        Err(self.not_supported(Operation::CandlestickPatterns))
    }

    #[doc(hidden)]
    fn not_supported(&self, operation: Operation) -> VendorError {
        VendorError::NotSupported {
            operation: operation.method_name().to_string(),
            vendor: self.id().to_string(),
        }
    }
}

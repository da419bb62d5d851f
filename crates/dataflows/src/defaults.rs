//! Standard vendor presets and method routes.
//!
//! | Method                                              | Vendor order                          |
//! |-----------------------------------------------------|---------------------------------------|
//! | stock data, indicators, fundamentals                | longbridge, yfinance, alpha_vantage   |
//! | balance sheet, cash flow, income statement          | alpha_vantage, yfinance, longbridge   |
//! | news, global news, insider transactions             | alpha_vantage, yfinance               |
//! | candlestick patterns                                | longbridge, yfinance                  |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::errors::FetchError;
use crate::fetch::{FetchManager, FetchManagerBuilder, MinimumLookback, SkipWeekendEndDate};
use crate::invoker::{AdapterInvoker, Invoker, Operation, VendorAdapter};
use crate::models::{VendorOptions, VendorPriority};

pub const LONGBRIDGE: &str = "longbridge";
pub const YFINANCE: &str = "yfinance";
pub const ALPHA_VANTAGE: &str = "alpha_vantage";

/// Minimum history requested for price data, in calendar days.
pub const MIN_STOCK_LOOKBACK_DAYS: u32 = 200;

/// Standard vendors with their priorities and overrides.
pub fn standard_vendors() -> Vec<(&'static str, VendorPriority, VendorOptions)> {
    vec![
        (
            LONGBRIDGE,
            VendorPriority::Primary,
            VendorOptions::new().rate_limit_wait(Duration::from_secs(2)),
        ),
        (
            YFINANCE,
            VendorPriority::Secondary,
            VendorOptions::new().rate_limit_wait(Duration::from_secs(1)),
        ),
        // Free tier allows 5 requests per minute
        (
            ALPHA_VANTAGE,
            VendorPriority::Fallback,
            VendorOptions::new()
                .max_retries(2)
                .rate_limit_wait(Duration::from_secs(12)),
        ),
    ]
}

pub fn register_standard_vendors(manager: &FetchManager) -> Result<(), FetchError> {
    for (name, priority, options) in standard_vendors() {
        manager.register_vendor(name, priority, options)?;
    }
    Ok(())
}

/// Vendor order for an operation.
pub fn standard_order(operation: Operation) -> &'static [&'static str] {
    match operation {
        Operation::StockData
        | Operation::Indicators
        | Operation::Fundamentals => &[LONGBRIDGE, YFINANCE, ALPHA_VANTAGE],
        Operation::BalanceSheet
        | Operation::Cashflow
        | Operation::IncomeStatement => &[ALPHA_VANTAGE, YFINANCE, LONGBRIDGE],
        Operation::News
        | Operation::GlobalNews
        | Operation::InsiderTransactions => &[ALPHA_VANTAGE, YFINANCE],
        Operation::CandlestickPatterns => &[LONGBRIDGE, YFINANCE],
    }
}

/// Register every operation for the given adapters, using the standard orders.
///
/// Orders are restricted to the adapters supplied; an operation none of them
/// serves is skipped. Adapter ids must already be registered as vendors.
pub fn register_standard_routes(
    manager: &FetchManager,
    adapters: &[Arc<dyn VendorAdapter>],
) -> Result<(), FetchError> {
    let by_id: HashMap<&str, &Arc<dyn VendorAdapter>> =
        adapters.iter().map(|adapter| (adapter.id(), adapter)).collect();

    for operation in Operation::ALL {
        let order: Vec<String> = standard_order(operation)
            .iter()
            .filter(|vendor| by_id.contains_key(*vendor))
            .map(|vendor| vendor.to_string())
            .collect();
        if order.is_empty() {
            debug!("No adapter serves '{}', skipping", operation);
            continue;
        }

        let invokers: HashMap<String, Arc<dyn Invoker>> = order
            .iter()
            .filter_map(|vendor| by_id.get(vendor.as_str()).map(|adapter| (vendor, adapter)))
            .map(|(vendor, adapter)| {
                let invoker: Arc<dyn Invoker> =
                    Arc::new(AdapterInvoker::new(Arc::clone(adapter), operation));
                (vendor.clone(), invoker)
            })
            .collect();

        manager.register_method(operation.method_name(), invokers, Some(order))?;
    }
    info!("Registered standard routes for {} adapter(s)", adapters.len());
    Ok(())
}

impl FetchManagerBuilder {
    /// Price-data hooks: widen short ranges to the minimum lookback and don't
    /// cache ranges ending on a weekend.
    pub fn standard_policies(self) -> Self {
        let method = Operation::StockData.method_name();
        self.normalizer(MinimumLookback::new(method, MIN_STOCK_LOOKBACK_DAYS))
            .cache_policy(SkipWeekendEndDate::new([method]))
    }
}

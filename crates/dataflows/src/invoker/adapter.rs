use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::VendorError;
use crate::models::FetchArgs;

use super::{Invoker, Operation, VendorAdapter};

/// Binds one operation family of a [`VendorAdapter`] into an [`Invoker`].
pub struct AdapterInvoker {
    adapter: Arc<dyn VendorAdapter>,
    operation: Operation,
}

impl AdapterInvoker {
    pub fn new(adapter: Arc<dyn VendorAdapter>, operation: Operation) -> Self {
        Self { adapter, operation }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

#[async_trait]
impl Invoker for AdapterInvoker {
    async fn invoke(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        let adapter = self.adapter.as_ref();
        match self.operation {
            Operation::StockData => adapter.get_stock_data(args).await,
            Operation::Indicators => adapter.get_indicators(args).await,
            Operation::Fundamentals => adapter.get_fundamentals(args).await,
            Operation::BalanceSheet => adapter.get_balance_sheet(args).await,
            Operation::Cashflow => adapter.get_cashflow(args).await,
            Operation::IncomeStatement => adapter.get_income_statement(args).await,
            Operation::News => adapter.get_news(args).await,
            Operation::GlobalNews => adapter.get_global_news(args).await,
            Operation::InsiderTransactions => adapter.get_insider_transactions(args).await,
            Operation::CandlestickPatterns => adapter.get_candlestick_patterns(args).await,
        }
    }
}

/// [`Invoker`] backed by an async closure.
///
/// The closure receives an owned copy of the arguments.
pub struct FnInvoker<F> {
    f: F,
}

impl<F, Fut> FnInvoker<F>
where
    F: Fn(FetchArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, VendorError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Invoker for FnInvoker<F>
where
    F: Fn(FetchArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, VendorError>> + Send + 'static,
{
    async fn invoke(&self, args: &FetchArgs) -> Result<Value, VendorError> {
        (self.f)(args.clone()).await
    }
}

/// Box an async closure as a shareable invoker.
pub fn invoker_fn<F, Fut>(f: F) -> Arc<dyn Invoker>
where
    F: Fn(FetchArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, VendorError>> + Send + 'static,
{
    Arc::new(FnInvoker::new(f))
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operation families served by vendor adapters.
///
/// Each maps to the method name callers pass to `fetch`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    StockData,
    Indicators,
    Fundamentals,
    BalanceSheet,
    Cashflow,
    IncomeStatement,
    News,
    GlobalNews,
    InsiderTransactions,
    CandlestickPatterns,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::StockData,
        Operation::Indicators,
        Operation::Fundamentals,
        Operation::BalanceSheet,
        Operation::Cashflow,
        Operation::IncomeStatement,
        Operation::News,
        Operation::GlobalNews,
        Operation::InsiderTransactions,
        Operation::CandlestickPatterns,
    ];

    pub fn method_name(self) -> &'static str {
        match self {
            Self::StockData => "get_stock_data",
            Self::Indicators => "get_indicators",
            Self::Fundamentals => "get_fundamentals",
            Self::BalanceSheet => "get_balance_sheet",
            Self::Cashflow => "get_cashflow",
            Self::IncomeStatement => "get_income_statement",
            Self::News => "get_news",
            Self::GlobalNews => "get_global_news",
            Self::InsiderTransactions => "get_insider_transactions",
            Self::CandlestickPatterns => "get_candlestick_patterns",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.method_name() == s)
            .ok_or_else(|| format!("Unknown operation: {}", s))
    }
}

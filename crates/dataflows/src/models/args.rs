use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments of a single fetch.
///
/// Positional arguments keep their order; keyword arguments are kept sorted by
/// name so that two requests differing only in keyword order produce the same
/// cache key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchArgs {
    pub positional: Vec<Value>,
    pub keyword: BTreeMap<String, Value>,
}

impl FetchArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional values only.
    ///
    /// ```
    /// use tradingagents_dataflows::FetchArgs;
    ///
    /// let args = FetchArgs::positional(["AAPL", "2024-01-01", "2024-01-31"]);
    /// assert_eq!(args.str_at(0), Some("AAPL"));
    /// ```
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keyword: BTreeMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn at(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Positional argument as a string slice, if it is a JSON string.
    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.at(index).and_then(Value::as_str)
    }

    /// Replace a positional argument. Out-of-range indexes are ignored.
    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) {
        if let Some(slot) = self.positional.get_mut(index) {
            *slot = value.into();
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let args = FetchArgs::new()
            .arg("NVDA")
            .arg("close_50_sma")
            .kwarg("look_back_days", 120);

        assert_eq!(args.str_at(0), Some("NVDA"));
        assert_eq!(args.get("look_back_days"), Some(&json!(120)));
        assert_eq!(args.len(), 3);
        assert!(!args.is_empty());
    }

    #[test]
    fn test_keywords_are_sorted() {
        let a = FetchArgs::new().kwarg("limit", 10).kwarg("curr_date", "2024-05-01");
        let b = FetchArgs::new().kwarg("curr_date", "2024-05-01").kwarg("limit", 10);
        assert_eq!(a, b);
        assert_eq!(
            a.keyword.keys().collect::<Vec<_>>(),
            vec!["curr_date", "limit"]
        );
    }

    #[test]
    fn test_set_at_ignores_out_of_range() {
        let mut args = FetchArgs::positional(["AAPL"]);
        args.set_at(0, "MSFT");
        args.set_at(3, "ignored");
        assert_eq!(args.positional, vec![json!("MSFT")]);
    }
}

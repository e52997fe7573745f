//! Currency and rate table abstractions

use super::error::ConversionError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Short currency identifier such as "USD".
pub type CurrencyCode = String;

/// Rates expressed against a single base currency: 1 unit of `base` = `rate` units of the key.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub base: CurrencyCode,
    pub date: Option<NaiveDate>,
    rates: BTreeMap<CurrencyCode, f64>,
}

impl RateTable {
    pub fn new(base: &str, rates: BTreeMap<CurrencyCode, f64>) -> Self {
        RateTable {
            base: base.to_string(),
            date: None,
            rates,
        }
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// Usable rate for `code`. Zero, negative and non-finite entries count as absent.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates
            .get(code)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Currency codes in the order the table iterates them.
    pub fn codes(&self) -> Vec<CurrencyCode> {
        self.rates.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, &f64)> {
        self.rates.iter()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the current rates for `base`. Any transport, status or body problem is a
    /// `ConversionError::RateFetch`.
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, ConversionError>;
}

use crate::core::currency::{RateSource, RateTable};
use crate::core::error::ConversionError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Rate source backed by the exchangerate-api.com `latest/<BASE>` endpoint.
pub struct ExchangeRateApiProvider {
    base_url: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: BTreeMap<String, f64>,
    date: Option<NaiveDate>,
}

#[async_trait]
impl RateSource for ExchangeRateApiProvider {
    #[instrument(name = "RateFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, ConversionError> {
        let url = format!("{}/{}", self.base_url, base);
        debug!("Requesting rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxconv/0.1")
            .build()
            .map_err(|e| ConversionError::rate_fetch(base, e.to_string()))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConversionError::rate_fetch(base, format!("Request error: {e}")))?;

        if !response.status().is_success() {
            return Err(ConversionError::rate_fetch(
                base,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ConversionError::rate_fetch(base, format!("Body error: {e}")))?;

        let data: LatestRatesResponse = serde_json::from_str(&text).map_err(|e| {
            ConversionError::rate_fetch(base, format!("Failed to parse JSON response: {e}"))
        })?;

        let table = RateTable::new(base, data.rates).with_date(data.date);
        if table.is_empty() {
            return Err(ConversionError::rate_fetch(base, "No rates in response"));
        }

        debug!(count = table.len(), date = ?table.date, "Received rates");
        Ok(table)
    }
}

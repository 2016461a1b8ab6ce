//! Alpha Vantage `GLOBAL_QUOTE` client.
//!
//! The public `demo` key is accepted by the provider for a handful of
//! symbols; anything else answers with an `Information` notice and no quote.

use crate::utils::text::preview;
use crate::core::types::{Quote, QuoteProvider};
use crate::error::UpstreamError;
use crate::tickers::Ticker;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
pub const DEMO_API_KEY: &str = "demo";

const SYMBOL: &str = "01. symbol";
const OPEN: &str = "02. open";
const HIGH: &str = "03. high";
const LOW: &str = "04. low";
const PRICE: &str = "05. price";
const VOLUME: &str = "06. volume";
const LATEST_TRADING_DAY: &str = "07. latest trading day";
const PREVIOUS_CLOSE: &str = "08. previous close";
const CHANGE: &str = "09. change";
const CHANGE_PERCENT: &str = "10. change percent";

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<HashMap<String, String>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Clone)]
pub struct AlphaVantage {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl AlphaVantage {
    pub fn new(client: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn quote_url(&self, symbol: &Ticker) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.join("query")?;
        url.query_pairs_mut()
            .append_pair("function", "GLOBAL_QUOTE")
            .append_pair("symbol", symbol.as_str())
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantage {
    async fn fetch_quote(&self, symbol: &Ticker) -> Result<Option<Quote>, UpstreamError> {
        let url = self.quote_url(symbol)?;
        // The url carries the api key, so only the symbol is logged.
        log::debug!("Alpha Vantage GLOBAL_QUOTE request for {}", symbol);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status,
                body: preview(&body, 200),
            });
        }

        let body = response.text().await?;
        parse_global_quote(&body)
    }
}

/// Maps a raw `GLOBAL_QUOTE` body to a [`Quote`].
///
/// `Ok(None)` whenever the body carries no quote object (missing or empty),
/// including `Error Message` rejections and rate-limit or demo-key notices.
pub fn parse_global_quote(body: &str) -> Result<Option<Quote>, UpstreamError> {
    let response: GlobalQuoteResponse = serde_json::from_str(body).map_err(|e| {
        UpstreamError::Malformed(format!("{} in body {}", e, preview(body, 200)))
    })?;

    if let Some(fields) = response.global_quote.filter(|q| !q.is_empty()) {
        return normalize(&fields).map(Some);
    }

    if let Some(message) = response.error_message {
        log::debug!("Alpha Vantage rejected symbol: {}", message);
        return Ok(None);
    }

    if let Some(notice) = response.note.or(response.information) {
        log::warn!("Alpha Vantage returned no quote: {}", notice);
        return Ok(None);
    }

    Ok(None)
}

fn normalize(fields: &HashMap<String, String>) -> Result<Quote, UpstreamError> {
    Ok(Quote {
        symbol: field(fields, SYMBOL)?.to_string(),
        open: number(fields, OPEN)?,
        high: number(fields, HIGH)?,
        low: number(fields, LOW)?,
        price: number(fields, PRICE)?,
        volume: number(fields, VOLUME)?,
        latest_trading_day: field(fields, LATEST_TRADING_DAY)?.to_string(),
        previous_close: number(fields, PREVIOUS_CLOSE)?,
        change: number(fields, CHANGE)?,
        change_percent: field(fields, CHANGE_PERCENT)?.to_string(),
    })
}

fn field<'a>(fields: &'a HashMap<String, String>, key: &str) -> Result<&'a str, UpstreamError> {
    fields
        .get(key)
        .map(|v| v.trim())
        .ok_or_else(|| UpstreamError::Malformed(format!("missing field '{}'", key)))
}

fn number<T: FromStr>(fields: &HashMap<String, String>, key: &str) -> Result<T, UpstreamError> {
    let raw = field(fields, key)?;
    raw.parse().map_err(|_| {
        UpstreamError::Malformed(format!("field '{}' is not a number: {:?}", key, raw))
    })
}

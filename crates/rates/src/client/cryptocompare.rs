//! CryptoCompare `pricemulti` gateway.
//!
//! `GET {base_url}/data/pricemulti?fsyms=BTC,ETH&tsyms=USD` answers with
//! `{"BTC":{"USD":106000.0},"ETH":{"USD":3900.0}}`. Symbols the upstream
//! does not know are left out of the object. When none of them are known
//! the upstream answers 200 with an error envelope instead:
//! `{"Response":"Error","Message":"cccagg_or_exchange market does not exist for this coin pair (ZZZ-USD)"}`.
//!
//! `fsyms` is capped upstream at 300 characters, so long title lists are
//! split across several requests.

use crate::error::{RatesError, RatesResult};
use crate::provider::PriceProvider;
use crate::types::PriceRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com";
pub const DEFAULT_QUOTE_CURRENCY: &str = "USD";

const PRICE_MULTI_PATH: &str = "/data/pricemulti";
const UNKNOWN_MARKET_MARKER: &str = "market does not exist";
const MAX_FSYMS_LEN: usize = 300;

/// Split titles into comma-joined groups no longer than `max_len`. A title
/// longer than `max_len` on its own gets a group to itself.
fn fsyms_chunks(titles: &[String], max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for title in titles {
        if !current.is_empty() && current.len() + 1 + title.len() > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(',');
        }
        current.push_str(title);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Price provider backed by the CryptoCompare REST API.
#[derive(Debug, Clone)]
pub struct CryptoCompareProvider {
    base_url: String,
    quote_currency: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl CryptoCompareProvider {
    /// Create a gateway. Fails if `quote_currency` is empty.
    pub fn new(base_url: &str, quote_currency: &str, timeout: Duration) -> RatesResult<Self> {
        if quote_currency.is_empty() {
            return Err(RatesError::invalid_argument("quote currency cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RatesError::provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            quote_currency: quote_currency.to_string(),
            api_key: None,
            timeout,
            client,
        })
    }

    pub fn from_config(config: &config::ProviderConfig) -> RatesResult<Self> {
        let provider = Self::new(
            &config.base_url,
            &config.quote_currency,
            Duration::from_secs(config.timeout_seconds),
        )?;
        Ok(match config.api_key() {
            Some(key) => provider.with_api_key(key),
            None => provider,
        })
    }

    /// Send `authorization: Apikey <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }

    fn map_transport_error(&self, err: reqwest::Error) -> RatesError {
        if err.is_timeout() {
            RatesError::ProviderTimeout(self.timeout)
        } else {
            RatesError::provider(format!("request to CryptoCompare failed: {}", err))
        }
    }

    /// Turn a decoded body into records, skipping unusable entries.
    fn parse_body(&self, body: Value) -> RatesResult<Vec<PriceRecord>> {
        let Value::Object(entries) = body else {
            return Err(RatesError::provider("unexpected response shape from CryptoCompare"));
        };

        if entries.get("Response").and_then(Value::as_str) == Some("Error") {
            let message = entries
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if message.contains(UNKNOWN_MARKET_MARKER) {
                debug!(upstream = message, "No requested symbol is known upstream");
                return Ok(Vec::new());
            }
            return Err(RatesError::provider(format!(
                "CryptoCompare returned an error: {}",
                message
            )));
        }

        let mut records = Vec::with_capacity(entries.len());
        for (title, quotes) in entries {
            let Some(cost) = quotes.get(&self.quote_currency).and_then(Value::as_f64) else {
                debug!(%title, quote = %self.quote_currency, "No quote in response");
                continue;
            };
            match PriceRecord::new(title.clone(), cost) {
                Ok(record) => records.push(record),
                Err(e) => warn!(%title, error = %e, "Skipping invalid price"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl PriceProvider for CryptoCompareProvider {
    #[instrument(skip(self, titles), fields(count = titles.len()))]
    async fn fetch_rates(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
        let mut records = Vec::with_capacity(titles.len());
        for fsyms in fsyms_chunks(titles, MAX_FSYMS_LEN) {
            records.extend(self.fetch_chunk(fsyms).await?);
        }
        debug!(resolved = records.len(), "Fetched prices from CryptoCompare");
        Ok(records)
    }

    fn name(&self) -> &str {
        "cryptocompare"
    }
}

impl CryptoCompareProvider {
    /// One `pricemulti` request for an already joined `fsyms` value.
    async fn fetch_chunk(&self, fsyms: String) -> RatesResult<Vec<PriceRecord>> {
        let url = format!("{}{}", self.base_url, PRICE_MULTI_PATH);
        let mut request = self.client.get(&url).query(&[
            ("fsyms", fsyms),
            ("tsyms", self.quote_currency.clone()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Apikey {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(RatesError::provider(format!(
                "CryptoCompare returned HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let body: Value = serde_json::from_slice(&bytes)?;

        self.parse_body(body)
    }
}

//! Price provider trait and the static implementation.
//!
//! A provider resolves titles to current prices in a single quote currency.
//! Titles it does not know are silently omitted from the result; only a
//! failure of the call as a whole is an error.

use crate::error::RatesResult;
use crate::types::PriceRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Trait for fetching current prices from an upstream source.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch current prices for the given titles.
    ///
    /// Returns only the titles that could be resolved. The titles passed in
    /// are expected to be free of duplicates.
    async fn fetch_rates(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>>;

    /// Short name for logging.
    fn name(&self) -> &str;
}

/// Static price provider - returns fixed prices from config.
pub struct StaticPriceProvider {
    prices: HashMap<String, f64>,
}

impl StaticPriceProvider {
    pub fn new(prices: HashMap<String, f64>) -> Self {
        Self { prices }
    }

    pub fn from_config(config: &config::ProviderConfig) -> Self {
        Self {
            prices: config.static_prices.clone(),
        }
    }
}

#[async_trait]
impl PriceProvider for StaticPriceProvider {
    async fn fetch_rates(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
        let mut records = Vec::with_capacity(titles.len());
        for title in titles {
            let Some(cost) = self.prices.get(title) else {
                debug!(%title, "No static price configured");
                continue;
            };
            match PriceRecord::new(title.clone(), *cost) {
                Ok(record) => records.push(record),
                Err(e) => warn!(%title, error = %e, "Skipping invalid static price"),
            }
        }
        Ok(records)
    }

    fn name(&self) -> &str {
        "static"
    }
}

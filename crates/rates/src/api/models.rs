//! API request/response models.

use crate::types::{AggregateRate, PriceRecord};
use serde::{Deserialize, Serialize};

/// Body of `POST /rates/last`.
#[derive(Debug, Deserialize)]
pub struct LastRatesRequest {
    #[serde(default)]
    pub titles: Vec<String>,
}

/// Body of `POST /rates/aggregate`.
#[derive(Debug, Deserialize)]
pub struct AggregateRatesRequest {
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(rename = "aggType", default)]
    pub agg_type: String,
}

/// Single coin in a rates response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CoinResponse {
    pub title: String,
    pub cost: f64,
}

impl From<PriceRecord> for CoinResponse {
    fn from(record: PriceRecord) -> Self {
        Self {
            title: record.title,
            cost: record.cost,
        }
    }
}

impl From<AggregateRate> for CoinResponse {
    fn from(rate: AggregateRate) -> Self {
        Self {
            title: rate.title,
            cost: rate.value,
        }
    }
}

/// Response for both rate queries.
#[derive(Debug, Serialize, Deserialize)]
pub struct RatesResponse {
    pub coins: Vec<CoinResponse>,
}

/// Response for `POST /rates/refresh`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub stored: usize,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: u16,
    pub message: String,
}

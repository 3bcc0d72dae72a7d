//! Core domain types for rates.
//!
//! - `PriceRecord`: one observed price of a title in the quote currency
//! - `AggregationKind`: AVERAGE, MINIMUM or MAXIMUM over a title's history
//! - `AggregateRate`: the aggregated value for one title
//! - `dedup_titles`: collapse a caller-supplied title list into a set

use crate::error::{RatesError, RatesResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A single observed price for a title.
///
/// Records are never mutated; a newer observation for the same title
/// supersedes an older one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Case-sensitive asset symbol, e.g. "BTC".
    pub title: String,
    /// Price in the quote currency. Always finite and positive.
    pub cost: f64,
    /// When the price was observed.
    pub observed_at: DateTime<Utc>,
}

impl PriceRecord {
    /// Create a record observed now.
    pub fn new(title: impl Into<String>, cost: f64) -> RatesResult<Self> {
        Self::observed_at(title, cost, Utc::now())
    }

    /// Create a record with an explicit observation time.
    pub fn observed_at(
        title: impl Into<String>,
        cost: f64,
        observed_at: DateTime<Utc>,
    ) -> RatesResult<Self> {
        let title = title.into();
        if title.is_empty() {
            return Err(RatesError::invalid_argument("title cannot be empty"));
        }
        if !cost.is_finite() || cost <= 0.0 {
            return Err(RatesError::invalid_argument(format!(
                "cost for {} must be greater than zero, got {}",
                title, cost
            )));
        }
        Ok(Self {
            title,
            cost,
            observed_at,
        })
    }
}

/// Statistic computed over the history of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationKind {
    Average,
    Minimum,
    Maximum,
}

impl AggregationKind {
    /// Parse the wire representation. Accepts `AVG`, `MIN`, `MAX` and the
    /// long forms `AVERAGE`, `MINIMUM`, `MAXIMUM`. Matching is exact.
    pub fn parse(s: &str) -> RatesResult<Self> {
        match s {
            "AVG" | "AVERAGE" => Ok(AggregationKind::Average),
            "MIN" | "MINIMUM" => Ok(AggregationKind::Minimum),
            "MAX" | "MAXIMUM" => Ok(AggregationKind::Maximum),
            "" => Err(RatesError::invalid_argument(
                "aggregation type cannot be empty",
            )),
            other => Err(RatesError::invalid_argument(format!(
                "invalid aggregation type '{}'",
                other
            ))),
        }
    }

    /// Short wire code.
    pub fn code(&self) -> &'static str {
        match self {
            AggregationKind::Average => "AVG",
            AggregationKind::Minimum => "MIN",
            AggregationKind::Maximum => "MAX",
        }
    }

    /// SQL aggregate function name.
    pub fn sql_function(&self) -> &'static str {
        self.code()
    }

    /// Fold a non-empty slice of costs. Returns `None` for an empty slice.
    pub fn apply(&self, costs: &[f64]) -> Option<f64> {
        if costs.is_empty() {
            return None;
        }
        let value = match self {
            AggregationKind::Average => costs.iter().sum::<f64>() / costs.len() as f64,
            AggregationKind::Minimum => costs.iter().copied().fold(f64::INFINITY, f64::min),
            AggregationKind::Maximum => costs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(value)
    }
}

impl FromStr for AggregationKind {
    type Err = RatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Aggregated value for one title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRate {
    pub title: String,
    pub value: f64,
}

/// Collapse a title list into a set. No normalization is applied.
pub fn dedup_titles<S: AsRef<str>>(titles: &[S]) -> BTreeSet<String> {
    titles.iter().map(|t| t.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_record_valid() {
        let record = PriceRecord::new("BTC", 106000.0).unwrap();
        assert_eq!(record.title, "BTC");
        assert_eq!(record.cost, 106000.0);
    }

    #[test]
    fn test_price_record_rejects_empty_title() {
        let result = PriceRecord::new("", 106000.0);
        assert!(matches!(result, Err(RatesError::InvalidArgument(_))));
    }

    #[test]
    fn test_price_record_rejects_non_positive_cost() {
        assert!(PriceRecord::new("BTC", 0.0).is_err());
        assert!(PriceRecord::new("BTC", -1.0).is_err());
        assert!(PriceRecord::new("BTC", f64::NAN).is_err());
        assert!(PriceRecord::new("BTC", f64::INFINITY).is_err());
    }

    #[test]
    fn test_aggregation_kind_parse() {
        assert_eq!(AggregationKind::parse("AVG").unwrap(), AggregationKind::Average);
        assert_eq!(AggregationKind::parse("MINIMUM").unwrap(), AggregationKind::Minimum);
        assert_eq!("MAX".parse::<AggregationKind>().unwrap(), AggregationKind::Maximum);

        assert!(matches!(
            AggregationKind::parse(""),
            Err(RatesError::InvalidArgument(_))
        ));
        assert!(matches!(
            AggregationKind::parse("SUM"),
            Err(RatesError::InvalidArgument(_))
        ));
        // Exact match only
        assert!(AggregationKind::parse("max").is_err());
    }

    #[test]
    fn test_aggregation_kind_apply() {
        let costs = [100.0, 300.0];
        assert_eq!(AggregationKind::Maximum.apply(&costs), Some(300.0));
        assert_eq!(AggregationKind::Minimum.apply(&costs), Some(100.0));
        assert_eq!(AggregationKind::Average.apply(&costs), Some(200.0));
        assert_eq!(AggregationKind::Average.apply(&[]), None);
    }

    #[test]
    fn test_dedup_titles_is_case_sensitive() {
        let titles = dedup_titles(&["BTC", "BTC", "btc", "ETH"]);
        assert_eq!(titles.len(), 3);
        assert!(titles.contains("btc"));
    }
}

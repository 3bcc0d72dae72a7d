//! Database row models for the `coins` table.

use crate::error::RatesResult;
use crate::types::{AggregateRate, PriceRecord};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One row of `coins`.
#[derive(Debug, Clone, FromRow)]
pub struct CoinRow {
    pub id: i64,
    pub title: String,
    pub cost: f64,
    pub actual_at: DateTime<Utc>,
}

impl CoinRow {
    /// Convert to the domain type. Re-validates the cost.
    pub fn into_domain(self) -> RatesResult<PriceRecord> {
        PriceRecord::observed_at(self.title, self.cost, self.actual_at)
    }
}

/// Result row of a `GROUP BY title` aggregate.
#[derive(Debug, Clone, FromRow)]
pub struct AggregateRow {
    pub title: String,
    pub value: Option<f64>,
}

impl AggregateRow {
    /// `None` when the aggregate was NULL.
    pub fn into_domain(self) -> Option<AggregateRate> {
        self.value.map(|value| AggregateRate {
            title: self.title,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RatesError;

    #[test]
    fn test_coin_row_into_domain() {
        let row = CoinRow {
            id: 1,
            title: "BTC".to_string(),
            cost: 106000.0,
            actual_at: Utc::now(),
        };
        let record = row.into_domain().unwrap();
        assert_eq!(record.title, "BTC");

        let bad = CoinRow {
            id: 2,
            title: "BTC".to_string(),
            cost: 0.0,
            actual_at: Utc::now(),
        };
        assert!(matches!(bad.into_domain(), Err(RatesError::InvalidArgument(_))));
    }

    #[test]
    fn test_null_aggregate_dropped() {
        let row = AggregateRow {
            title: "BTC".to_string(),
            value: None,
        };
        assert!(row.into_domain().is_none());
    }
}

//! Rate storage traits and implementations.
//!
//! This module defines the `RateStore` trait that abstracts away storage details.
//! The Postgres adapter lives in `crate::db`; an in-memory store is provided here
//! for tests and local runs.

use crate::error::RatesResult;
use crate::types::{AggregateRate, AggregationKind, PriceRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Trait for durable price storage.
///
/// Every title may carry many historical records. Point lookups always
/// return the most recent record per title.
///
/// # Example
///
/// ```ignore
/// use rates::{PriceRecord, RateStore};
///
/// async fn example(store: &dyn RateStore) -> rates::RatesResult<()> {
///     store.save_batch(vec![PriceRecord::new("BTC", 50000.0)?]).await?;
///     let current = store.current_by_titles(&["BTC".to_string()]).await?;
///     println!("BTC = {}", current[0].cost);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RateStore: Send + Sync {
    /// All titles that have at least one record.
    async fn list_known_titles(&self) -> RatesResult<BTreeSet<String>>;

    /// Persist a batch of records. Either every record is stored or none is.
    async fn save_batch(&self, records: Vec<PriceRecord>) -> RatesResult<()>;

    /// Latest record per title. Unknown titles are absent from the result.
    async fn current_by_titles(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>>;

    /// Aggregate over the full history per title. Titles without history are
    /// absent from the result.
    async fn aggregate_by_titles(
        &self,
        titles: &[String],
        kind: AggregationKind,
    ) -> RatesResult<Vec<AggregateRate>>;

    /// Cheap round trip proving the store is reachable.
    async fn ping(&self) -> RatesResult<()> {
        Ok(())
    }
}

/// In-memory implementation of RateStore.
///
/// This is useful for testing and development. For production,
/// use `PostgresRateStore`.
#[derive(Debug)]
pub struct InMemoryRateStore {
    history: Arc<RwLock<HashMap<String, Vec<PriceRecord>>>>,
}

impl InMemoryRateStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            history: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: impl IntoIterator<Item = PriceRecord>) -> Self {
        let store = Self::new();
        {
            let mut history = store.history.write();
            for record in records {
                history.entry(record.title.clone()).or_default().push(record);
            }
        }
        store
    }

    /// Total number of records across all titles.
    pub fn len(&self) -> usize {
        self.history.read().values().map(Vec::len).sum()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.history.read().is_empty()
    }

    /// Number of records held for a title.
    pub fn history_len(&self, title: &str) -> usize {
        self.history.read().get(title).map_or(0, Vec::len)
    }

    /// Clear all records from the store.
    pub fn clear(&self) {
        self.history.write().clear();
    }
}

impl Default for InMemoryRateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryRateStore {
    fn clone(&self) -> Self {
        Self {
            history: Arc::clone(&self.history),
        }
    }
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn list_known_titles(&self) -> RatesResult<BTreeSet<String>> {
        Ok(self.history.read().keys().cloned().collect())
    }

    async fn save_batch(&self, records: Vec<PriceRecord>) -> RatesResult<()> {
        // Single write lock: readers see the batch entirely or not at all
        let mut history = self.history.write();
        for record in records {
            history.entry(record.title.clone()).or_default().push(record);
        }
        Ok(())
    }

    async fn current_by_titles(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
        let history = self.history.read();
        let wanted: BTreeSet<&String> = titles.iter().collect();

        let results = wanted
            .into_iter()
            .filter_map(|title| {
                history.get(title).and_then(|records| {
                    // Latest observation wins; later insertion breaks ties
                    records.iter().max_by_key(|r| r.observed_at).cloned()
                })
            })
            .collect();

        Ok(results)
    }

    async fn aggregate_by_titles(
        &self,
        titles: &[String],
        kind: AggregationKind,
    ) -> RatesResult<Vec<AggregateRate>> {
        let history = self.history.read();
        let wanted: BTreeSet<&String> = titles.iter().collect();

        let results = wanted
            .into_iter()
            .filter_map(|title| {
                let costs: Vec<f64> = history.get(title)?.iter().map(|r| r.cost).collect();
                kind.apply(&costs).map(|value| AggregateRate {
                    title: title.clone(),
                    value,
                })
            })
            .collect();

        Ok(results)
    }
}

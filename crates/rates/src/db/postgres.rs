//! PostgreSQL implementation of the `RateStore` trait.
//!
//! All history lives in one append-only `coins` table. A batch is written
//! with a single `UNNEST` insert inside a transaction.

use crate::db::models::{AggregateRow, CoinRow};
use crate::error::{RatesError, RatesResult};
use crate::store::RateStore;
use crate::types::{AggregateRate, AggregationKind, PriceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// PostgreSQL-backed rate store.
#[derive(Debug, Clone)]
pub struct PostgresRateStore {
    pool: PgPool,
}

impl PostgresRateStore {
    /// Connect a new pool. Every session runs with `statement_timeout`
    /// set to `query_timeout`.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
        query_timeout: Duration,
    ) -> RatesResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| RatesError::store(format!("Invalid database url: {}", e)))?
            .options([("statement_timeout", query_timeout.as_millis().to_string())]);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| RatesError::store(format!("Failed to connect to database: {}", e)))?;

        info!(
            max_connections,
            statement_timeout_ms = query_timeout.as_millis() as u64,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    pub async fn from_config(config: &config::DatabaseConfig) -> RatesResult<Self> {
        Self::new(
            &config.url,
            config.max_connections,
            Duration::from_secs(config.connection_timeout_seconds),
            Duration::from_secs(config.query_timeout_seconds),
        )
        .await
    }

    /// Create the `coins` table and its index if missing.
    pub async fn run_migrations(&self) -> RatesResult<()> {
        let migration_sql = include_str!("../../../../migrations/001_create_coins.sql");
        sqlx::raw_sql(migration_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| RatesError::store(format!("Migration failed: {}", e)))?;
        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl RateStore for PostgresRateStore {
    async fn ping(&self) -> RatesResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RatesError::store(format!("Database ping failed: {}", e)))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_known_titles(&self) -> RatesResult<BTreeSet<String>> {
        let titles = sqlx::query_scalar::<_, String>("SELECT DISTINCT title FROM coins")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RatesError::store(format!("Failed to list titles: {}", e)))?;

        debug!(count = titles.len(), "Fetched known titles");
        Ok(titles.into_iter().collect())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn save_batch(&self, records: Vec<PriceRecord>) -> RatesResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let count = records.len();
        let mut titles: Vec<String> = Vec::with_capacity(count);
        let mut costs: Vec<f64> = Vec::with_capacity(count);
        let mut observed: Vec<DateTime<Utc>> = Vec::with_capacity(count);
        for record in records {
            titles.push(record.title);
            costs.push(record.cost);
            observed.push(record.observed_at);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RatesError::store(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO coins (title, cost, actual_at)
            SELECT * FROM UNNEST($1::TEXT[], $2::FLOAT8[], $3::TIMESTAMPTZ[])
            "#,
        )
        .bind(&titles)
        .bind(&costs)
        .bind(&observed)
        .execute(&mut *tx)
        .await
        .map_err(|e| RatesError::store(format!("Failed to insert coins: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| RatesError::store(format!("Failed to commit coins: {}", e)))?;

        info!(count, "Stored price records");
        Ok(())
    }

    #[instrument(skip(self, titles), fields(requested = titles.len()))]
    async fn current_by_titles(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, CoinRow>(
            r#"
            SELECT DISTINCT ON (title) id, title, cost, actual_at
            FROM coins
            WHERE title = ANY($1)
            ORDER BY title, actual_at DESC, id DESC
            "#,
        )
        .bind(titles)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RatesError::store(format!("Failed to fetch current rates: {}", e)))?;

        rows.into_iter().map(CoinRow::into_domain).collect()
    }

    #[instrument(skip(self, titles), fields(requested = titles.len()))]
    async fn aggregate_by_titles(
        &self,
        titles: &[String],
        kind: AggregationKind,
    ) -> RatesResult<Vec<AggregateRate>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        // The function name comes from a closed enum, never from input
        let query = format!(
            "SELECT title, {}(cost) AS value FROM coins WHERE title = ANY($1) GROUP BY title ORDER BY title",
            kind.sql_function()
        );
        let rows = sqlx::query_as::<_, AggregateRow>(&query)
            .bind(titles)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RatesError::store(format!("Failed to aggregate rates: {}", e)))?;

        Ok(rows.into_iter().filter_map(AggregateRow::into_domain).collect())
    }
}

//! Database layer for rate storage.
//!
//! PostgreSQL implementation of the `RateStore` trait over the `coins` table.

pub mod models;
pub mod postgres;

pub use models::{AggregateRow, CoinRow};
pub use postgres::PostgresRateStore;

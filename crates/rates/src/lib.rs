//! # Rates Crate
//!
//! Current and historical cryptocurrency prices, backed by a durable store
//! and a third-party price provider.
//!
//! ## Key Components
//!
//! - **Domain Types**: `PriceRecord`, `AggregationKind`, `AggregateRate`
//! - **Traits**: `RateStore` for storage, `PriceProvider` for upstream prices
//! - **Engine**: `RateService` backfills titles the store lacks before answering
//! - **Worker**: `RefreshWorker` re-fetches every known title on an interval
//!
//! ## Architecture
//!
//! ```text
//!        HTTP API (api)           RefreshWorker (worker)
//!              │                          │
//!              └────────────┬─────────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │     RateService     │
//!                └──────────┬──────────┘
//!                ┌──────────┴──────────┐
//!                ▼                     ▼
//!          RateStore             PriceProvider
//!   InMemory │ Postgres (db)   Static │ CryptoCompare (client)
//! ```

pub mod error;
pub mod provider;
pub mod service;
pub mod store;
pub mod types;
pub mod worker;

#[cfg(feature = "postgres")]
pub mod db;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for convenience
pub use error::{ErrorKind, RatesError, RatesResult};
pub use provider::{PriceProvider, StaticPriceProvider};
pub use service::{RateService, RateServiceConfig};
pub use store::{InMemoryRateStore, RateStore};
pub use types::{dedup_titles, AggregateRate, AggregationKind, PriceRecord};
pub use worker::RefreshWorker;

#[cfg(feature = "postgres")]
pub use db::PostgresRateStore;

#[cfg(feature = "client")]
pub use client::CryptoCompareProvider;

#[cfg(feature = "api")]
pub use api::{rates_routes, RatesApiState};

//! Observability infrastructure for CoinRates
//!
//! - Structured logging via `tracing`
//! - Prometheus metrics and the counters the rate engine reports
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("coinrates", LogFormat::Json)?;
//! observability::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, RatesMetrics};

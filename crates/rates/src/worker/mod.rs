//! Background refresh of known rates.
//!
//! The worker periodically asks the `RateService` to pull fresh prices for
//! every title the store already knows, until shutdown.

pub mod service;

pub use service::RefreshWorker;

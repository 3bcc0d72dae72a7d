//! HTTP API for rate queries.
//!
//! - `handlers` - axum handlers over a shared `RateService`
//! - `models` - request/response types
//! - `routes` - router construction

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::RatesApiState;
pub use routes::rates_routes;

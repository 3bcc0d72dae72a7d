//! Axum route definitions for the rates API.

use crate::api::handlers::{self, RatesApiState};
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

/// Create all rate routes.
///
/// # Routes
///
/// - `POST /rates/last` - Latest price per title
/// - `POST /rates/aggregate` - AVG/MIN/MAX over each title's history
/// - `POST /rates/refresh` - Refresh every known title now
pub fn rates_routes(state: Arc<RatesApiState>) -> Router {
    Router::new()
        .route("/rates/last", post(handlers::get_last_rates))
        .route("/rates/aggregate", post(handlers::get_aggregate_rates))
        .route("/rates/refresh", post(handlers::refresh_rates))
        .with_state(state)
}

//! HTTP request handlers for the rates API.

use crate::api::models::*;
use crate::error::{ErrorKind, RatesError};
use crate::service::RateService;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{error, warn};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared state for rate API handlers.
pub struct RatesApiState {
    pub service: Arc<RateService>,
}

impl RatesApiState {
    pub fn new(service: Arc<RateService>) -> Self {
        Self { service }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            code: status.as_u16(),
            message: message.into(),
        }),
    )
}

/// HTTP status for a service error.
pub fn status_for(err: &RatesError) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ProviderUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn map_error(err: RatesError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "Rate request failed");
    } else {
        warn!(error = %err, "Rate request rejected");
    }
    error_response(status, err.to_string())
}

fn map_rejection(rejection: JsonRejection) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Drop empty strings; an empty remainder is a bad request.
fn non_empty_titles(titles: Vec<String>) -> Result<Vec<String>, ApiError> {
    let titles: Vec<String> = titles.into_iter().filter(|t| !t.is_empty()).collect();
    if titles.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "titles must contain at least one non-empty title",
        ));
    }
    Ok(titles)
}

/// POST /rates/last
pub async fn get_last_rates(
    State(state): State<Arc<RatesApiState>>,
    payload: Result<Json<LastRatesRequest>, JsonRejection>,
) -> Result<Json<RatesResponse>, ApiError> {
    let Json(request) = payload.map_err(map_rejection)?;
    let titles = non_empty_titles(request.titles)?;

    let records = state
        .service
        .get_last_rates(&titles)
        .await
        .map_err(map_error)?;

    Ok(Json(RatesResponse {
        coins: records.into_iter().map(CoinResponse::from).collect(),
    }))
}

/// POST /rates/aggregate
pub async fn get_aggregate_rates(
    State(state): State<Arc<RatesApiState>>,
    payload: Result<Json<AggregateRatesRequest>, JsonRejection>,
) -> Result<Json<RatesResponse>, ApiError> {
    let Json(request) = payload.map_err(map_rejection)?;
    let titles = non_empty_titles(request.titles)?;

    let rates = state
        .service
        .get_aggregate_rates(&titles, &request.agg_type)
        .await
        .map_err(map_error)?;

    Ok(Json(RatesResponse {
        coins: rates.into_iter().map(CoinResponse::from).collect(),
    }))
}

/// POST /rates/refresh
pub async fn refresh_rates(
    State(state): State<Arc<RatesApiState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let stored = state
        .service
        .refresh_known_rates()
        .await
        .map_err(map_error)?;

    Ok(Json(RefreshResponse { stored }))
}

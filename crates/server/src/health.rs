//! Liveness endpoint.
//!
//! `GET /health` runs every registered [`HealthCheck`] on each request.
//! It answers 200 while all pass and 503 once any fails or times out.

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Bound on a single check.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// A dependency probed on every health request, e.g. the database.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    /// `Err` carries a short reason shown in the response.
    async fn check(&self) -> Result<(), String>;
}

/// Outcome of one check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub name: String,
    pub up: bool,
    pub error: Option<String>,
}

/// Shared state for the health endpoint.
pub struct HealthState {
    pub service_name: String,
    start_time: Instant,
    checks: Vec<Arc<dyn HealthCheck>>,
    check_timeout: Duration,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            start_time: Instant::now(),
            checks: Vec::new(),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Run every check, each bounded by the check timeout.
    pub async fn probe(&self) -> Vec<DependencyStatus> {
        let mut statuses = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let outcome = match tokio::time::timeout(self.check_timeout, check.check()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(format!(
                    "no answer within {}ms",
                    self.check_timeout.as_millis()
                )),
            };
            if let Err(reason) = &outcome {
                warn!(dependency = check.name(), %reason, "Health check failed");
            }
            statuses.push(DependencyStatus {
                name: check.name().to_string(),
                up: outcome.is_ok(),
                error: outcome.err(),
            });
        }
        statuses
    }
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> (StatusCode, Json<Value>) {
    let dependencies = state.probe().await;
    let healthy = dependencies.iter().all(|d| d.up);
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if healthy { "ok" } else { "degraded" },
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "dependencies": dependencies,
    });

    (status_code, Json(body))
}

/// Create health check router
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

//! Error types for the rates crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for rate operations.
pub type RatesResult<T> = Result<T, RatesError>;

/// Errors that can occur in rate operations.
#[derive(Error, Debug, Clone)]
pub enum RatesError {
    /// Empty title list, empty or unknown aggregation kind, invalid record.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested titles that neither the store nor the provider could resolve.
    #[error("Rates not found for titles: {}", titles.join(", "))]
    NotFound { titles: Vec<String> },

    /// Transport failure or non-2xx response from the price provider.
    #[error("Price provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The price provider did not answer within the configured bound.
    #[error("Price provider timed out after {}ms", .0.as_millis())]
    ProviderTimeout(Duration),

    /// Persistence or query failure in the durable store.
    #[error("Store failure: {0}")]
    StoreFailure(String),
}

/// Coarse classification of a [`RatesError`], used at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    ProviderUnavailable,
    StoreFailure,
}

impl RatesError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error for the given titles
    pub fn not_found<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotFound {
            titles: titles.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a provider unavailable error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Create a store failure error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreFailure(msg.into())
    }

    /// The kind of failure. Timeouts are a provider failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RatesError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RatesError::NotFound { .. } => ErrorKind::NotFound,
            RatesError::ProviderUnavailable(_) | RatesError::ProviderTimeout(_) => {
                ErrorKind::ProviderUnavailable
            }
            RatesError::StoreFailure(_) => ErrorKind::StoreFailure,
        }
    }
}

impl From<serde_json::Error> for RatesError {
    fn from(err: serde_json::Error) -> Self {
        RatesError::ProviderUnavailable(format!("malformed provider response: {}", err))
    }
}

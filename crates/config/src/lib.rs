//! CoinRates configuration.
//!
//! A single YAML file with `${VAR}` substitution. Every section and most
//! fields have defaults, so a file only needs what differs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoinRatesConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl ServiceConfig {
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

/// Where price history is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "memory" | "in_memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// `postgres` or `memory`
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
    /// Upper bound on any single store operation.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
    #[serde(default = "default_enabled")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: String::new(),
            max_connections: default_max_connections(),
            connection_timeout_seconds: default_connection_timeout(),
            query_timeout_seconds: default_query_timeout(),
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn backend(&self) -> Option<StoreBackend> {
        StoreBackend::parse(&self.backend)
    }
}

/// Which price provider answers backfills and refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    CryptoCompare,
    Static,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cryptocompare" => Some(Self::CryptoCompare),
            "static" => Some(Self::Static),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// `cryptocompare` or `static`
    #[serde(default = "default_provider_kind")]
    pub kind: String,
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Fixed prices for the static provider.
    #[serde(default)]
    pub static_prices: HashMap<String, f64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            base_url: default_provider_base_url(),
            quote_currency: default_quote_currency(),
            timeout_seconds: default_provider_timeout(),
            api_key: None,
            static_prices: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    pub fn kind(&self) -> Option<ProviderKind> {
        ProviderKind::parse(&self.kind)
    }

    /// The API key, unless empty or an unresolved `${VAR}` placeholder.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty() && !has_unresolved_env_vars(key))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,
    #[serde(default)]
    pub run_on_startup: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_refresh_interval(),
            run_on_startup: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `pretty`, `json` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

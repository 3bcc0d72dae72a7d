//! Default values for configuration fields.

use serde_yaml::Value;

pub const DEFAULT_CONFIG_PATH: &str = "config/coinrates.yaml";
pub const CONFIG_PATH_ENV: &str = "CONFIG_FILE_PATH";

pub fn default_enabled() -> bool {
    true
}

pub fn default_service_name() -> String {
    "coinrates".to_string()
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    8080
}

pub fn default_backend() -> String {
    "postgres".to_string()
}

pub fn default_max_connections() -> u32 {
    20
}

pub fn default_connection_timeout() -> u64 {
    30
}

pub fn default_query_timeout() -> u64 {
    10
}

pub fn default_provider_kind() -> String {
    "cryptocompare".to_string()
}

pub fn default_provider_base_url() -> String {
    "https://min-api.cryptocompare.com".to_string()
}

pub fn default_quote_currency() -> String {
    "USD".to_string()
}

pub fn default_provider_timeout() -> u64 {
    10
}

pub fn default_refresh_interval() -> u64 {
    300
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

/// Fields with a default, as `(section, key, default rendered for display)`.
const DEFAULTED_FIELDS: &[(&str, &str, &str)] = &[
    ("service", "name", "coinrates"),
    ("service", "host", "0.0.0.0"),
    ("service", "http_port", "8080"),
    ("database", "backend", "postgres"),
    ("database", "max_connections", "20"),
    ("database", "connection_timeout_seconds", "30"),
    ("database", "query_timeout_seconds", "10"),
    ("database", "run_migrations", "true"),
    ("provider", "kind", "cryptocompare"),
    ("provider", "base_url", "https://min-api.cryptocompare.com"),
    ("provider", "quote_currency", "USD"),
    ("provider", "timeout_seconds", "10"),
    ("refresh", "enabled", "true"),
    ("refresh", "interval_seconds", "300"),
    ("refresh", "run_on_startup", "false"),
    ("logging", "format", "pretty"),
    ("metrics", "enabled", "false"),
    ("metrics", "port", "9090"),
];

/// Defaulted fields absent from a raw YAML document, as `(path, value)`.
pub fn missing_defaults(raw: &Value) -> Vec<(String, String)> {
    DEFAULTED_FIELDS
        .iter()
        .filter(|(section, key, _)| raw.get(*section).and_then(|s| s.get(*key)).is_none())
        .map(|(section, key, value)| (format!("{}.{}", section, key), value.to_string()))
        .collect()
}

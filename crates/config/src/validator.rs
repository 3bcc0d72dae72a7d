use crate::*;
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("service.host '{0}' must be an IP address, e.g. 0.0.0.0 or 127.0.0.1")]
    InvalidHost(String),

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("metrics.port {port} collides with service.http_port")]
    PortConflict { port: u16 },

    #[error("Invalid store backend: {0}. Must be one of: postgres, memory")]
    InvalidStoreBackend(String),

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },

    #[error("Invalid provider kind: {0}. Must be one of: cryptocompare, static")]
    InvalidProviderKind(String),

    #[error("Provider base_url '{url}' is invalid: {message}")]
    InvalidProviderUrl { url: String, message: String },

    #[error("Provider quote_currency cannot be empty")]
    EmptyQuoteCurrency,

    #[error("Static provider requires at least one entry in static_prices")]
    MissingStaticPrices,

    #[error("Static price for {title} must be a positive number, got {value}")]
    InvalidStaticPrice { title: String, value: f64 },

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable listing: defaults, then warnings, then errors.
impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.defaults_applied.is_empty() {
            writeln!(f, "Defaults applied: {}", self.defaults_applied.len())?;
            for d in &self.defaults_applied {
                writeln!(f, "  [default] {} = {}", d.field, d.value)?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f, "Warnings: {}", self.warnings.len())?;
            for w in &self.warnings {
                writeln!(f, "  [warn] {}: {}", w.field, w.message)?;
            }
        }
        if !self.errors.is_empty() {
            writeln!(f, "Errors: {}", self.errors.len())?;
            for e in &self.errors {
                writeln!(f, "  [error] {}", e)?;
            }
        }
        Ok(())
    }
}

pub fn validate_config(config: &CoinRatesConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_service(config, &mut report);
    validate_database(&config.database, &mut report);
    validate_provider(&config.provider, &mut report);
    validate_refresh(&config.refresh, &mut report);

    if !["pretty", "json", "compact"].contains(&config.logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }

    report
}

fn positive(value: u64, field: &str, report: &mut ValidationReport) {
    if value == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: field.to_string(),
        });
    }
}

fn validate_service(config: &CoinRatesConfig, report: &mut ValidationReport) {
    let service = &config.service;
    if service.name.trim().is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    }
    if service.host.parse::<IpAddr>().is_err() {
        report.add_error(ValidationError::InvalidHost(service.host.clone()));
    }
    positive(service.http_port.into(), "service.http_port", report);

    if config.metrics.enabled {
        positive(config.metrics.port.into(), "metrics.port", report);
        if config.metrics.port == service.http_port {
            report.add_error(ValidationError::PortConflict {
                port: config.metrics.port,
            });
        }
    }
}

fn validate_database(database: &DatabaseConfig, report: &mut ValidationReport) {
    let Some(backend) = database.backend() else {
        report.add_error(ValidationError::InvalidStoreBackend(database.backend.clone()));
        return;
    };

    positive(
        database.query_timeout_seconds,
        "database.query_timeout_seconds",
        report,
    );

    if backend == StoreBackend::Memory {
        report.add_warning(
            "database.backend",
            "memory backend keeps price history only for the life of the process",
        );
        return;
    }

    if database.url.is_empty() || has_unresolved_env_vars(&database.url) {
        report.add_error(ValidationError::InvalidEnvVar {
            var: "DATABASE_URL".to_string(),
            message: "database url is missing or unresolved".to_string(),
        });
    }
    positive(database.max_connections.into(), "database.max_connections", report);
    positive(
        database.connection_timeout_seconds,
        "database.connection_timeout_seconds",
        report,
    );
}

fn validate_provider(provider: &ProviderConfig, report: &mut ValidationReport) {
    if provider.quote_currency.is_empty() {
        report.add_error(ValidationError::EmptyQuoteCurrency);
    }
    positive(provider.timeout_seconds, "provider.timeout_seconds", report);

    match provider.kind() {
        Some(ProviderKind::CryptoCompare) => {
            if let Err(e) = url::Url::parse(&provider.base_url) {
                report.add_error(ValidationError::InvalidProviderUrl {
                    url: provider.base_url.clone(),
                    message: e.to_string(),
                });
            }
            if provider.api_key().is_none() {
                report.add_warning(
                    "provider.api_key",
                    "no API key set; CryptoCompare applies anonymous rate limits",
                );
            }
        }
        Some(ProviderKind::Static) => {
            if provider.static_prices.is_empty() {
                report.add_error(ValidationError::MissingStaticPrices);
            }
            for (title, value) in &provider.static_prices {
                if !value.is_finite() || *value <= 0.0 {
                    report.add_error(ValidationError::InvalidStaticPrice {
                        title: title.clone(),
                        value: *value,
                    });
                }
            }
        }
        None => report.add_error(ValidationError::InvalidProviderKind(provider.kind.clone())),
    }
}

fn validate_refresh(refresh: &RefreshConfig, report: &mut ValidationReport) {
    if !refresh.enabled {
        report.add_warning("refresh.enabled", "stored prices will only change on backfill");
        return;
    }
    positive(refresh.interval_seconds, "refresh.interval_seconds", report);
}

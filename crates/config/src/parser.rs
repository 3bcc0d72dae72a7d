//! Loading and saving configuration files.

use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Config file location: explicit path, else `CONFIG_FILE_PATH`, else
/// `config/coinrates.yaml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

fn read_substituted(path: &Path) -> Result<String> {
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    debug!("Config file content length: {} bytes", content.len());

    let substituted = substitution::substitute_env_vars(&content)?;
    debug!("Environment variable substitution completed");
    Ok(substituted)
}

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CoinRatesConfig> {
    let substituted = read_substituted(path.as_ref())?;

    let config: CoinRatesConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Load, validate, and record which fields fell back to defaults.
#[instrument(skip(path))]
pub fn load_config_with_report<P: AsRef<Path>>(
    path: P,
) -> Result<(CoinRatesConfig, ValidationReport)> {
    let substituted = read_substituted(path.as_ref())?;

    let raw: serde_yaml::Value = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;
    let config: CoinRatesConfig = serde_yaml::from_value(raw.clone())
        .with_context(|| "Failed to parse YAML configuration")?;

    let mut report = validate_config(&config);
    for (field, value) in missing_defaults(&raw) {
        report.add_default(&field, &value);
    }
    Ok((config, report))
}

#[instrument]
pub fn generate_default_config() -> CoinRatesConfig {
    let mut config = CoinRatesConfig::default();
    config.database.url = "${DATABASE_URL}".to_string();
    config.provider.api_key = Some("${CRYPTOCOMPARE_API_KEY}".to_string());
    config.provider.static_prices = [("BTC", 50000.0), ("ETH", 3000.0)]
        .into_iter()
        .map(|(title, cost)| (title.to_string(), cost))
        .collect();
    config
}

#[instrument(skip(config))]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &CoinRatesConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

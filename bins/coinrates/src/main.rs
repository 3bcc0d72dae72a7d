//! CoinRates CLI and Server Binary
//!
//! Wires configuration, storage, the price provider and the HTTP API
//! together and runs the `start`, `refresh`, `validate` and `init`
//! commands.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cli::{Cli, Commands};
use config::{
    generate_default_config, load_config, load_config_with_report, resolve_config_path,
    save_config, validate_config, CoinRatesConfig, ProviderKind, StoreBackend,
};
use observability::{init_logging, init_metrics, LogFormat};
use rates::{
    rates_routes, CryptoCompareProvider, InMemoryRateStore, PostgresRateStore, PriceProvider,
    RateService, RateServiceConfig, RateStore, RatesApiState, RefreshWorker, StaticPriceProvider,
};
use server::{
    health_routes, HealthCheck, HealthState, HttpServer, Server, ServerConfig, ShutdownController,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start { config, http } => start_command(config, http).await,
        Commands::Refresh { config } => refresh_command(config).await,
        Commands::Validate { config } => {
            init_logging("coinrates", LogFormat::Pretty)?;
            validate_command(config)
        }
        Commands::Init { output } => {
            init_logging("coinrates", LogFormat::Pretty)?;
            init_command(&output)
        }
    }
}

/// Load the config, install logging in its format, and refuse to go on
/// when validation fails.
fn load_checked(explicit: Option<PathBuf>) -> Result<CoinRatesConfig> {
    let path = resolve_config_path(explicit.as_deref());
    let config = load_config(&path)?;

    let format = LogFormat::parse(&config.logging.format).unwrap_or_default();
    init_logging(&config.service.name, format)?;
    info!(path = ?path, "Configuration loaded");

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        for err in &report.errors {
            error!(error = %err, "Invalid configuration");
        }
        anyhow::bail!("{} has {} configuration error(s)", path.display(), report.errors.len());
    }

    Ok(config)
}

/// Health probe running a store round trip through the engine.
struct StoreCheck(Arc<RateService>);

#[async_trait]
impl HealthCheck for StoreCheck {
    fn name(&self) -> &str {
        "store"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        self.0.check_store().await.map_err(|e| e.to_string())
    }
}

/// Store and provider chosen by config, plus the engine over them.
async fn build_service(config: &CoinRatesConfig) -> Result<Arc<RateService>> {
    let store: Arc<dyn RateStore> = match config.database.backend() {
        Some(StoreBackend::Memory) => {
            info!("Using in-memory rate store");
            Arc::new(InMemoryRateStore::new())
        }
        Some(StoreBackend::Postgres) => {
            let store = PostgresRateStore::from_config(&config.database)
                .await
                .context("Failed to connect to database")?;
            if config.database.run_migrations {
                store.run_migrations().await?;
            }
            Arc::new(store)
        }
        None => anyhow::bail!("Unknown store backend: {}", config.database.backend),
    };

    let provider: Arc<dyn PriceProvider> = match config.provider.kind() {
        Some(ProviderKind::Static) => Arc::new(StaticPriceProvider::from_config(&config.provider)),
        Some(ProviderKind::CryptoCompare) => {
            Arc::new(CryptoCompareProvider::from_config(&config.provider)?)
        }
        None => anyhow::bail!("Unknown provider kind: {}", config.provider.kind),
    };
    info!(provider = provider.name(), "Price provider configured");

    Ok(Arc::new(RateService::new(
        store,
        provider,
        RateServiceConfig::from_config(config),
    )))
}

async fn start_command(config_path: Option<PathBuf>, http_override: Option<u16>) -> Result<()> {
    let config = load_checked(config_path)?;

    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
    }

    let service = build_service(&config).await?;
    let health = Arc::new(
        HealthState::new(config.service.name.clone())
            .with_check(Arc::new(StoreCheck(service.clone()))),
    );

    let shutdown = ShutdownController::with_signals();

    let worker_handle = if config.refresh.enabled {
        let worker = RefreshWorker::from_config(service.clone(), &config.refresh);
        let token = shutdown.child_token();
        Some(tokio::spawn(async move { worker.run(token).await }))
    } else {
        info!("Refresh worker disabled");
        None
    };

    let router = rates_routes(Arc::new(RatesApiState::new(service))).merge(health_routes(health));

    let http_port = http_override.unwrap_or(config.service.http_port);
    let server = HttpServer::new(ServerConfig::new(config.service.host.clone(), http_port), router);

    info!(service = %config.service.name, http_port, "Starting CoinRates");
    let result = server.run(shutdown.child_token()).await;

    // Stop the worker whether the server exited cleanly or not
    shutdown.shutdown();
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            error!(%e, "Refresh worker task failed");
        }
    }

    result.context("HTTP server failed")
}

async fn refresh_command(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_checked(config_path)?;
    let service = build_service(&config).await?;

    let worker = RefreshWorker::from_config(service, &config.refresh);
    let stored = worker.run_cycle().await.context("Refresh failed")?;

    println!("Refreshed {} title(s)", stored);
    Ok(())
}

fn validate_command(config_path: Option<PathBuf>) -> Result<()> {
    let path = resolve_config_path(config_path.as_deref());
    info!(?path, "Validating configuration");

    let (config, report) = load_config_with_report(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    print!("{}", report);
    if !report.is_valid() {
        anyhow::bail!("{}: {} error(s)", path.display(), report.errors.len());
    }

    println!("{} is valid", path.display());
    println!("Service: {}", config.service.name);
    println!("Listen: {}", config.service.http_address());
    println!("Store: {}", config.database.backend);
    println!(
        "Provider: {} ({})",
        config.provider.kind, config.provider.quote_currency
    );
    if config.refresh.enabled {
        println!("Refresh: every {}s", config.refresh.interval_seconds);
    } else {
        println!("Refresh: disabled");
    }

    Ok(())
}

fn init_command(output_path: &Path) -> Result<()> {
    info!(path = %output_path.display(), "Writing default configuration");

    let config = generate_default_config();
    save_config(&config, output_path)?;

    println!("Wrote {}", output_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set DATABASE_URL (or set database.backend to memory)");
    println!("  2. Optionally set CRYPTOCOMPARE_API_KEY");
    println!(
        "  3. coinrates validate --config {}",
        output_path.display()
    );
    println!(
        "  4. coinrates start --config {}",
        output_path.display()
    );

    Ok(())
}

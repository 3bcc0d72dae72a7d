//! Prometheus metrics.
//!
//! `init_metrics` installs the global recorder and its scrape endpoint.
//! `RatesMetrics` holds the counters the rate engine and refresh worker
//! report. Without an installed recorder every handle is a no-op.

use metrics::{counter, histogram, Counter, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter, serving `/metrics` on `port`.
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Counters for rate reconciliation.
///
/// # Metrics
///
/// * `rates_provider_fetches_total` - provider calls issued
/// * `rates_provider_failures_total` - provider calls that failed or timed out
/// * `rates_provider_fetch_seconds` - provider call latency
/// * `rates_titles_backfilled_total` - titles fetched because the store lacked them
/// * `rates_refresh_cycles_total` - refresh cycles, labelled by outcome
/// * `rates_records_stored_total` - price records persisted
#[derive(Clone)]
pub struct RatesMetrics {
    provider: String,
    provider_fetches: Counter,
    provider_failures: Counter,
    provider_latency: Histogram,
    titles_backfilled: Counter,
    records_stored: Counter,
}

impl RatesMetrics {
    /// Create the metric set for a named provider (e.g. "cryptocompare").
    pub fn new(provider: &str) -> Self {
        let name = provider.to_string();

        Self {
            provider_fetches: counter!("rates_provider_fetches_total", "provider" => name.clone()),
            provider_failures: counter!("rates_provider_failures_total", "provider" => name.clone()),
            provider_latency: histogram!("rates_provider_fetch_seconds", "provider" => name.clone()),
            titles_backfilled: counter!("rates_titles_backfilled_total"),
            records_stored: counter!("rates_records_stored_total"),
            provider: name,
        }
    }

    /// Record a completed provider call.
    pub fn record_fetch(&self, elapsed: Duration, ok: bool) {
        self.provider_fetches.increment(1);
        self.provider_latency.record(elapsed.as_secs_f64());
        if !ok {
            self.provider_failures.increment(1);
        }
    }

    pub fn titles_backfilled(&self, count: usize) {
        self.titles_backfilled.increment(count as u64);
    }

    pub fn records_stored(&self, count: usize) {
        self.records_stored.increment(count as u64);
    }

    /// Record the outcome of one refresh cycle.
    pub fn refresh_cycle(&self, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        counter!("rates_refresh_cycles_total", "outcome" => outcome).increment(1);
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_metrics_without_recorder() {
        let metrics = RatesMetrics::new("static");
        metrics.record_fetch(Duration::from_millis(5), false);
        metrics.titles_backfilled(2);
        metrics.records_stored(2);
        metrics.refresh_cycle(true);
        assert_eq!(metrics.provider(), "static");
    }
}

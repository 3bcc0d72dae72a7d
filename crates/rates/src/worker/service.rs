//! Refresh worker service.

use crate::error::RatesResult;
use crate::service::RateService;
use config::RefreshConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Background worker that refreshes every known title on a fixed interval.
pub struct RefreshWorker {
    service: Arc<RateService>,
    interval: Duration,
    run_on_startup: bool,
}

impl RefreshWorker {
    /// Create a new RefreshWorker.
    pub fn new(service: Arc<RateService>, interval: Duration, run_on_startup: bool) -> Self {
        Self {
            service,
            interval,
            run_on_startup,
        }
    }

    pub fn from_config(service: Arc<RateService>, config: &RefreshConfig) -> Self {
        Self::new(
            service,
            Duration::from_secs(config.interval_seconds),
            config.run_on_startup,
        )
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// A failed cycle is logged and the next tick proceeds. Cancellation
    /// aborts an in-flight cycle.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            run_on_startup = self.run_on_startup,
            "Starting RefreshWorker"
        );

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.run_on_startup {
            // First tick completes immediately
            timer.tick().await;
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("RefreshWorker shutting down.");
                    return;
                }
                _ = timer.tick() => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            info!("RefreshWorker cancelled mid-cycle, shutting down.");
                            return;
                        }
                        result = self.run_cycle() => {
                            if let Err(e) = result {
                                error!(error = %e, "Refresh cycle failed");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Run a single refresh cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> RatesResult<usize> {
        let stored = self.service.refresh_known_rates().await?;
        info!(stored, "Refresh cycle complete");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RatesError;
    use crate::provider::PriceProvider;
    use crate::service::RateServiceConfig;
    use crate::store::InMemoryRateStore;
    use crate::types::PriceRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PriceProvider for CountingProvider {
        async fn fetch_rates(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RatesError::provider("HTTP 502"));
            }
            titles.iter().map(|t| PriceRecord::new(t.clone(), 42.0)).collect()
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn setup(fail: bool) -> (InMemoryRateStore, Arc<CountingProvider>, Arc<RateService>) {
        let store = InMemoryRateStore::with_records(vec![PriceRecord::new("BTC", 1.0).unwrap()]);
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail,
        });
        let service = Arc::new(RateService::new(
            Arc::new(store.clone()),
            provider.clone(),
            RateServiceConfig::default(),
        ));
        (store, provider, service)
    }

    #[tokio::test]
    async fn test_run_cycle_refreshes_known_titles() {
        let (store, provider, service) = setup(false);
        let worker = RefreshWorker::new(service, Duration::from_secs(300), false);

        assert_eq!(worker.run_cycle().await.unwrap(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.history_len("BTC"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_cancelled() {
        let (store, provider, service) = setup(false);
        let worker = RefreshWorker::new(service, Duration::from_secs(300), true);
        let shutdown = CancellationToken::new();

        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };

        // Startup cycle plus two interval ticks
        tokio::time::sleep(Duration::from_secs(601)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.history_len("BTC"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_does_not_stop_worker() {
        let (store, provider, service) = setup(true);
        let worker = RefreshWorker::new(service, Duration::from_secs(60), false);
        let shutdown = CancellationToken::new();

        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_secs(125)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.history_len("BTC"), 1);
    }
}

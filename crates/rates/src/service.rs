//! Rate service - reconciles the store with the price provider.
//!
//! Every read first makes the store's known titles a superset of the
//! requested ones: titles the store has never seen are fetched from the
//! provider and persisted, then the answer is read back from the store.

use crate::error::{RatesError, RatesResult};
use crate::provider::PriceProvider;
use crate::store::RateStore;
use crate::types::{dedup_titles, AggregateRate, AggregationKind, PriceRecord};
use observability::RatesMetrics;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Default bound on a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a single store operation.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine settings.
#[derive(Debug, Clone)]
pub struct RateServiceConfig {
    /// Upper bound on any provider call, regardless of the gateway's own timeout.
    pub provider_timeout: Duration,
    /// Upper bound on any store call.
    pub store_timeout: Duration,
}

impl Default for RateServiceConfig {
    fn default() -> Self {
        Self {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl RateServiceConfig {
    pub fn from_config(config: &config::CoinRatesConfig) -> Self {
        Self {
            provider_timeout: Duration::from_secs(config.provider.timeout_seconds),
            store_timeout: Duration::from_secs(config.database.query_timeout_seconds),
        }
    }
}

/// High-level service answering rate queries.
///
/// Holds no cache of its own: each call re-derives which titles are missing
/// from the store's current title set. Concurrent calls may backfill the
/// same title twice; the store keeps both records and the later one wins.
pub struct RateService {
    store: Arc<dyn RateStore>,
    provider: Arc<dyn PriceProvider>,
    config: RateServiceConfig,
    metrics: RatesMetrics,
}

impl RateService {
    /// Create a new rate service.
    pub fn new(
        store: Arc<dyn RateStore>,
        provider: Arc<dyn PriceProvider>,
        config: RateServiceConfig,
    ) -> Self {
        let metrics = RatesMetrics::new(provider.name());
        Self {
            store,
            provider,
            config,
            metrics,
        }
    }

    /// Latest price for each requested title.
    ///
    /// Titles unknown to the store are backfilled from the provider first.
    /// Fails with `NotFound` if any title is still absent afterwards; no
    /// partial answer is returned.
    #[instrument(skip(self, titles), fields(requested = titles.len()))]
    pub async fn get_last_rates(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
        let wanted = requested_titles(titles)?;

        self.backfill(&wanted).await?;

        let records = self
            .bounded("current_by_titles", self.store.current_by_titles(&wanted))
            .await?;

        let found: BTreeSet<&str> = records.iter().map(|r| r.title.as_str()).collect();
        let missing: Vec<String> = wanted
            .iter()
            .filter(|t| !found.contains(t.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "Titles unresolved after backfill");
            return Err(RatesError::not_found(missing));
        }

        debug!(count = records.len(), "Returning last rates");
        Ok(records)
    }

    /// Aggregate over the full history of each requested title.
    ///
    /// `agg_kind` is validated before the store or provider is touched.
    /// Titles with no history after backfill are omitted.
    #[instrument(skip(self, titles), fields(requested = titles.len()))]
    pub async fn get_aggregate_rates(
        &self,
        titles: &[String],
        agg_kind: &str,
    ) -> RatesResult<Vec<AggregateRate>> {
        let kind = AggregationKind::parse(agg_kind)?;
        let wanted = requested_titles(titles)?;

        self.backfill(&wanted).await?;

        let rates = self
            .bounded("aggregate_by_titles", self.store.aggregate_by_titles(&wanted, kind))
            .await?;
        if rates.len() < wanted.len() {
            debug!(
                requested = wanted.len(),
                returned = rates.len(),
                "Some titles have no history"
            );
        }
        Ok(rates)
    }

    /// Fetch fresh prices for every title the store knows and append them.
    ///
    /// Returns the number of records stored. An empty store is a no-op and
    /// makes no provider call. A provider failure persists nothing.
    #[instrument(skip(self))]
    pub async fn refresh_known_rates(&self) -> RatesResult<usize> {
        let result = self.refresh().await;
        self.metrics.refresh_cycle(result.is_ok());
        result
    }

    async fn refresh(&self) -> RatesResult<usize> {
        let known = self
            .bounded("list_known_titles", self.store.list_known_titles())
            .await?;
        if known.is_empty() {
            info!("No known titles, nothing to refresh");
            return Ok(0);
        }

        let titles: Vec<String> = known.iter().cloned().collect();
        let fetched = self.fetch(&titles).await?;

        let records = retain_titles(fetched, &known);
        if records.len() < known.len() {
            warn!(
                known = known.len(),
                resolved = records.len(),
                "Provider did not resolve every known title"
            );
        }
        if records.is_empty() {
            return Ok(0);
        }

        let count = records.len();
        self.bounded("save_batch", self.store.save_batch(records))
            .await?;
        self.metrics.records_stored(count);

        info!(count, "Refreshed known rates");
        Ok(count)
    }

    /// Populate the store with any of `wanted` it does not know yet.
    async fn backfill(&self, wanted: &[String]) -> RatesResult<usize> {
        let known = self
            .bounded("list_known_titles", self.store.list_known_titles())
            .await?;
        let missing: BTreeSet<String> = wanted
            .iter()
            .filter(|t| !known.contains(*t))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        debug!(?missing, "Backfilling titles from provider");
        let request: Vec<String> = missing.iter().cloned().collect();
        let fetched = self.fetch(&request).await?;

        // Extra titles from the provider are ignored
        let records = retain_titles(fetched, &missing);
        if records.is_empty() {
            return Ok(0);
        }

        let count = records.len();
        self.bounded("save_batch", self.store.save_batch(records))
            .await?;
        self.metrics.titles_backfilled(count);
        self.metrics.records_stored(count);

        info!(count, "Backfilled titles");
        Ok(count)
    }

    /// Provider call bounded by `provider_timeout`.
    async fn fetch(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
        let start = Instant::now();
        let timeout = self.config.provider_timeout;

        let result = match tokio::time::timeout(timeout, self.provider.fetch_rates(titles)).await {
            Ok(result) => result,
            Err(_) => Err(RatesError::ProviderTimeout(timeout)),
        };
        self.metrics.record_fetch(start.elapsed(), result.is_ok());

        if let Err(e) = &result {
            warn!(provider = self.provider.name(), error = %e, "Provider fetch failed");
        }
        result
    }

    /// Store call bounded by `store_timeout`; an elapsed call is a store failure.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = RatesResult<T>>,
    ) -> RatesResult<T> {
        let timeout = self.config.store_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = timeout.as_millis() as u64, "Store call timed out");
                Err(RatesError::store(format!(
                    "{} timed out after {}ms",
                    operation,
                    timeout.as_millis()
                )))
            }
        }
    }

    /// Round trip to the store, for health checks.
    pub async fn check_store(&self) -> RatesResult<()> {
        self.bounded("ping", self.store.ping()).await
    }
}

/// Deduplicated, non-empty list of non-empty titles.
fn requested_titles(titles: &[String]) -> RatesResult<Vec<String>> {
    if titles.is_empty() {
        return Err(RatesError::invalid_argument("titles cannot be empty"));
    }
    if titles.iter().any(|t| t.is_empty()) {
        return Err(RatesError::invalid_argument("title cannot be empty"));
    }
    Ok(dedup_titles(titles).into_iter().collect())
}

fn retain_titles(records: Vec<PriceRecord>, allowed: &BTreeSet<String>) -> Vec<PriceRecord> {
    records
        .into_iter()
        .filter(|r| allowed.contains(&r.title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::InMemoryRateStore;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Provider that answers from a fixed table and records every request.
    struct RecordingProvider {
        prices: HashMap<String, f64>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingProvider {
        fn new(prices: &[(&str, f64)]) -> Self {
            Self {
                prices: prices.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl PriceProvider for RecordingProvider {
        async fn fetch_rates(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
            self.calls.lock().push(titles.to_vec());
            titles
                .iter()
                .filter_map(|t| self.prices.get(t).map(|p| PriceRecord::new(t.clone(), *p)))
                .collect()
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    /// Provider that returns every configured price whatever was asked.
    struct ChattyProvider(Vec<(&'static str, f64)>);

    #[async_trait]
    impl PriceProvider for ChattyProvider {
        async fn fetch_rates(&self, _titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
            self.0
                .iter()
                .map(|(t, p)| PriceRecord::new(*t, *p))
                .collect()
        }

        fn name(&self) -> &str {
            "chatty"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl PriceProvider for FailingProvider {
        async fn fetch_rates(&self, _titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
            Err(RatesError::provider("HTTP 503"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl PriceProvider for SlowProvider {
        async fn fetch_rates(&self, _titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    /// Store whose writes always fail.
    struct FailingStore(InMemoryRateStore);

    #[async_trait]
    impl RateStore for FailingStore {
        async fn list_known_titles(&self) -> RatesResult<BTreeSet<String>> {
            self.0.list_known_titles().await
        }

        async fn save_batch(&self, _records: Vec<PriceRecord>) -> RatesResult<()> {
            Err(RatesError::store("connection reset"))
        }

        async fn current_by_titles(&self, titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
            self.0.current_by_titles(titles).await
        }

        async fn aggregate_by_titles(
            &self,
            titles: &[String],
            kind: AggregationKind,
        ) -> RatesResult<Vec<AggregateRate>> {
            self.0.aggregate_by_titles(titles, kind).await
        }
    }

    /// Store whose reads never complete.
    struct HangingStore;

    #[async_trait]
    impl RateStore for HangingStore {
        async fn list_known_titles(&self) -> RatesResult<BTreeSet<String>> {
            std::future::pending().await
        }

        async fn save_batch(&self, _records: Vec<PriceRecord>) -> RatesResult<()> {
            std::future::pending().await
        }

        async fn current_by_titles(&self, _titles: &[String]) -> RatesResult<Vec<PriceRecord>> {
            std::future::pending().await
        }

        async fn aggregate_by_titles(
            &self,
            _titles: &[String],
            _kind: AggregationKind,
        ) -> RatesResult<Vec<AggregateRate>> {
            std::future::pending().await
        }

        async fn ping(&self) -> RatesResult<()> {
            std::future::pending().await
        }
    }

    fn titles(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn record_at(title: &str, cost: f64, minutes: i64) -> PriceRecord {
        let base = Utc.with_ymd_and_hms(2024, 12, 31, 8, 0, 0).unwrap();
        PriceRecord::observed_at(title, cost, base + ChronoDuration::minutes(minutes)).unwrap()
    }

    fn service(
        store: &InMemoryRateStore,
        provider: Arc<dyn PriceProvider>,
    ) -> RateService {
        RateService::new(
            Arc::new(store.clone()),
            provider,
            RateServiceConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_known_titles_skip_provider() {
        let store = InMemoryRateStore::with_records(vec![
            record_at("BTC", 100.0, 0),
            record_at("ETH", 10.0, 0),
        ]);
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0)]));
        let svc = service(&store, provider.clone());

        let rates = svc
            .get_last_rates(&titles(&["BTC", "ETH", "BTC"]))
            .await
            .unwrap();

        assert!(provider.calls().is_empty());
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].title, "BTC");
        assert_eq!(rates[0].cost, 100.0);
        assert_eq!(rates[1].title, "ETH");
    }

    #[tokio::test]
    async fn test_missing_title_is_backfilled() {
        let store = InMemoryRateStore::with_records(vec![record_at("BTC", 100000.0, 0)]);
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0), ("ETH", 3000.0)]));
        let svc = service(&store, provider.clone());

        let rates = svc.get_last_rates(&titles(&["BTC", "ETH"])).await.unwrap();

        assert_eq!(provider.calls(), vec![titles(&["ETH"])]);
        assert_eq!(store.history_len("ETH"), 1);
        assert_eq!(store.history_len("BTC"), 1);

        let by_title: HashMap<_, _> = rates.iter().map(|r| (r.title.as_str(), r.cost)).collect();
        assert_eq!(by_title.get("BTC"), Some(&100000.0));
        assert_eq!(by_title.get("ETH"), Some(&3000.0));
    }

    #[tokio::test]
    async fn test_duplicates_collapse_before_provider_call() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0), ("ETH", 2.0)]));
        let svc = service(&store, provider.clone());

        let rates = svc
            .get_last_rates(&titles(&["ETH", "BTC", "BTC", "ETH"]))
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], titles(&["BTC", "ETH"]));
        assert_eq!(rates.len(), 2);
    }

    #[tokio::test]
    async fn test_unresolved_title_is_not_found() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[]));
        let svc = service(&store, provider.clone());

        let err = svc.get_last_rates(&titles(&["ZZZ"])).await.unwrap_err();

        match err {
            RatesError::NotFound { titles } => assert_eq!(titles, vec!["ZZZ".to_string()]),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_partial_resolution_persists_resolved_titles() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 50000.0)]));
        let svc = service(&store, provider.clone());

        let err = svc
            .get_last_rates(&titles(&["BTC", "ZZZ"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("ZZZ"));
        assert!(!err.to_string().contains("BTC"));
        assert_eq!(store.history_len("BTC"), 1);
    }

    #[tokio::test]
    async fn test_empty_titles_rejected() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0)]));
        let svc = service(&store, provider.clone());

        let err = svc.get_last_rates(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = svc.get_aggregate_rates(&[], "MAX").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_string_title_rejected_before_backfill() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0)]));
        let svc = service(&store, provider.clone());

        let err = svc.get_last_rates(&titles(&[""])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = svc
            .get_aggregate_rates(&titles(&["BTC", ""]), "MAX")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert!(provider.calls().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_titles_match_case_sensitively() {
        let store = InMemoryRateStore::with_records(vec![record_at("BTC", 100.0, 0)]);
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0)]));
        let svc = service(&store, provider.clone());

        let err = svc.get_last_rates(&titles(&["btc"])).await.unwrap_err();

        assert_eq!(provider.calls(), vec![titles(&["btc"])]);
        match err {
            RatesError::NotFound { titles } => assert_eq!(titles, vec!["btc".to_string()]),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(store.history_len("btc"), 0);
        assert_eq!(store.history_len("BTC"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_times_out() {
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0)]));
        let svc = RateService::new(
            Arc::new(HangingStore),
            provider.clone(),
            RateServiceConfig {
                store_timeout: Duration::from_secs(3),
                ..Default::default()
            },
        );

        let err = svc.get_last_rates(&titles(&["BTC"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(err.to_string().contains("list_known_titles timed out after 3000ms"));

        let err = svc.refresh_known_rates().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);

        let err = svc.check_store().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_check_store_in_memory() {
        let store = InMemoryRateStore::new();
        let svc = service(&store, Arc::new(FailingProvider));
        assert!(svc.check_store().await.is_ok());
    }

    #[tokio::test]
    async fn test_extra_provider_titles_ignored() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(ChattyProvider(vec![("BTC", 1.0), ("DOGE", 0.1)]));
        let svc = service(&store, provider);

        svc.get_last_rates(&titles(&["BTC"])).await.unwrap();

        assert_eq!(store.history_len("BTC"), 1);
        assert_eq!(store.history_len("DOGE"), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let store = InMemoryRateStore::new();
        let svc = service(&store, Arc::new(FailingProvider));

        let err = svc.get_last_rates(&titles(&["BTC"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let store = InMemoryRateStore::new();
        let svc = RateService::new(
            Arc::new(store.clone()),
            Arc::new(SlowProvider),
            RateServiceConfig {
                provider_timeout: Duration::from_secs(2),
                ..Default::default()
            },
        );

        let err = svc.get_last_rates(&titles(&["BTC"])).await.unwrap_err();
        assert!(matches!(err, RatesError::ProviderTimeout(d) if d == Duration::from_secs(2)));
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }

    #[tokio::test]
    async fn test_store_failure_after_fetch() {
        let svc = RateService::new(
            Arc::new(FailingStore(InMemoryRateStore::new())),
            Arc::new(RecordingProvider::new(&[("BTC", 1.0)])),
            RateServiceConfig::default(),
        );

        let err = svc.get_last_rates(&titles(&["BTC"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
    }

    #[tokio::test]
    async fn test_aggregate_kinds() {
        let store = InMemoryRateStore::with_records(vec![
            record_at("BTC", 100.0, 0),
            record_at("BTC", 300.0, 5),
        ]);
        let provider = Arc::new(RecordingProvider::new(&[]));
        let svc = service(&store, provider.clone());
        let btc = titles(&["BTC"]);

        let max = svc.get_aggregate_rates(&btc, "MAX").await.unwrap();
        assert_eq!(max[0].value, 300.0);
        let min = svc.get_aggregate_rates(&btc, "MIN").await.unwrap();
        assert_eq!(min[0].value, 100.0);
        let avg = svc.get_aggregate_rates(&btc, "AVG").await.unwrap();
        assert_eq!(avg[0].value, 200.0);

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_kind_validated_before_backfill() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0)]));
        let svc = service(&store, provider.clone());

        for kind in ["", "SUM", "max"] {
            let err = svc
                .get_aggregate_rates(&titles(&["BTC"]), kind)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert!(provider.calls().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_backfills_and_omits_unresolved() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[("ETH", 3000.0)]));
        let svc = service(&store, provider.clone());

        let rates = svc
            .get_aggregate_rates(&titles(&["ETH", "ZZZ"]), "AVERAGE")
            .await
            .unwrap();

        assert_eq!(provider.calls(), vec![titles(&["ETH", "ZZZ"])]);
        assert_eq!(
            rates,
            vec![AggregateRate {
                title: "ETH".to_string(),
                value: 3000.0
            }]
        );
    }

    #[tokio::test]
    async fn test_refresh_with_empty_store_is_noop() {
        let store = InMemoryRateStore::new();
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 1.0)]));
        let svc = service(&store, provider.clone());

        assert_eq!(svc.refresh_known_rates().await.unwrap(), 0);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_appends_history() {
        let store = InMemoryRateStore::with_records(vec![
            record_at("BTC", 100.0, 0),
            record_at("ETH", 10.0, 0),
        ]);
        let provider = Arc::new(RecordingProvider::new(&[("BTC", 200.0), ("ETH", 20.0)]));
        let svc = service(&store, provider.clone());

        assert_eq!(svc.refresh_known_rates().await.unwrap(), 2);
        assert_eq!(svc.refresh_known_rates().await.unwrap(), 2);

        assert_eq!(provider.calls().len(), 2);
        assert_eq!(provider.calls()[0], titles(&["BTC", "ETH"]));
        assert_eq!(store.history_len("BTC"), 3);

        let last = svc.get_last_rates(&titles(&["BTC"])).await.unwrap();
        assert_eq!(last[0].cost, 200.0);
    }

    #[tokio::test]
    async fn test_refresh_ignores_unknown_titles() {
        let store = InMemoryRateStore::with_records(vec![record_at("BTC", 100.0, 0)]);
        let svc = service(
            &store,
            Arc::new(ChattyProvider(vec![("BTC", 2.0), ("DOGE", 0.1)])),
        );

        assert_eq!(svc.refresh_known_rates().await.unwrap(), 1);
        assert_eq!(store.history_len("DOGE"), 0);
    }

    #[tokio::test]
    async fn test_refresh_provider_failure_persists_nothing() {
        let store = InMemoryRateStore::with_records(vec![record_at("BTC", 100.0, 0)]);
        let svc = service(&store, Arc::new(FailingProvider));

        let err = svc.refresh_known_rates().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert_eq!(store.len(), 1);
    }
}

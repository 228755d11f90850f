//! Cache-backed, freshness-aware fetching of daily bars.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use marketlens_cache::{SetOptions, UnifiedCache};
use marketlens_core::error::{DataError, MarketResult};
use marketlens_core::traits::PriceSource;
use marketlens_core::types::PriceBar;
use marketlens_freshness::{DataFreshnessInfo, DataSource, FreshnessManager, FreshnessStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::rate_limiter::RateLimiter;
use crate::retry::{retry_through_limiter, RetryPolicy};
use crate::validation::{RecordValidator, ValidationReport};

/// Validated bars as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedBars {
    pub bars: Vec<PriceBar>,
    pub fetched_at: DateTime<Utc>,
    /// Validation quality score of the fetch that produced these bars
    pub quality: f64,
}

/// Bars plus where they came from and how fresh they are.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub bars: Vec<PriceBar>,
    pub freshness: DataFreshnessInfo,
    pub quality: f64,
}

/// Adapter timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Cached bars older than this are refetched
    pub data_ttl_minutes: u32,
    /// How long a cached copy is kept as a fallback for failed fetches
    pub retention: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            data_ttl_minutes: 60,
            retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Cache key of one bar request.
pub fn bars_cache_key(code: &str, from: NaiveDate, to: NaiveDate) -> String {
    format!("bars:{}:{}:{}", code, from, to)
}

fn code_tag(code: &str) -> String {
    format!("code:{}", code)
}

/// Fetches bars through a rate limiter, retries and validation, caching
/// the valid subset.
pub struct MarketDataAdapter {
    source: Arc<dyn PriceSource>,
    cache: Arc<UnifiedCache<CachedBars>>,
    freshness: FreshnessManager,
    limiter: RateLimiter,
    retry: RetryPolicy,
    validator: RecordValidator,
    config: AdapterConfig,
}

impl MarketDataAdapter {
    pub fn new(
        source: Arc<dyn PriceSource>,
        cache: Arc<UnifiedCache<CachedBars>>,
        freshness: FreshnessManager,
    ) -> Self {
        Self {
            source,
            cache,
            freshness,
            limiter: RateLimiter::default(),
            retry: RetryPolicy::default(),
            validator: RecordValidator::default(),
            config: AdapterConfig::default(),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_validator(mut self, validator: RecordValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &Arc<UnifiedCache<CachedBars>> {
        &self.cache
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Bars for `code` over `[from, to]`.
    ///
    /// A cached copy that has not expired is returned as is. Otherwise the
    /// source is queried; if that fails and a cached copy exists, the copy is
    /// returned marked as a fallback.
    pub async fn fetch_bars(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> MarketResult<FetchOutcome> {
        let key = bars_cache_key(code, from, to);
        let cached = self.cache.get(&key);

        if let Some(copy) = &cached {
            let info = self.freshness.freshness_info(
                copy.fetched_at,
                DataSource::Cache,
                Some(self.config.data_ttl_minutes),
            )?;
            if info.status != FreshnessStatus::Expired {
                debug!(key = %key, age_minutes = info.age_minutes, "Serving cached bars");
                return Ok(FetchOutcome {
                    bars: copy.bars.clone(),
                    freshness: info,
                    quality: copy.quality,
                });
            }
        }

        match self.fetch_validated(code, from, to).await {
            Ok(report) => {
                let fetched_at = Utc::now();
                let entry = CachedBars {
                    bars: report.accepted,
                    fetched_at,
                    quality: report.quality_score,
                };
                let options = SetOptions::default()
                    .with_ttl(self.config.retention)
                    .with_tags(["bars".to_string(), code_tag(code)])
                    .with_priority(report.quality_score / 100.0);
                self.cache.set(key, entry.clone(), options);

                let freshness = self.freshness.freshness_info(
                    fetched_at,
                    DataSource::Api,
                    Some(self.config.data_ttl_minutes),
                )?;
                Ok(FetchOutcome {
                    bars: entry.bars,
                    freshness,
                    quality: entry.quality,
                })
            }
            Err(err) => {
                let Some(copy) = cached else {
                    return Err(err.into());
                };
                warn!(code, error = %err, "Fetch failed, serving cached copy");
                let freshness = self.freshness.freshness_info(
                    copy.fetched_at,
                    DataSource::Fallback,
                    Some(self.config.data_ttl_minutes),
                )?;
                Ok(FetchOutcome {
                    bars: copy.bars,
                    freshness,
                    quality: copy.quality,
                })
            }
        }
    }

    /// Drop every cached request for `code`.
    pub fn invalidate(&self, code: &str) -> usize {
        let tag = code_tag(code);
        let removed = self.cache.remove_by_tags(&[tag.as_str()]);
        info!(code, removed, "Invalidated cached bars");
        removed
    }

    async fn fetch_validated(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ValidationReport, DataError> {
        let source = self.source.as_ref();
        let records = retry_through_limiter(&self.retry, &self.limiter, move || {
            source.daily_quotes(code, from, to)
        })
        .await?;

        let report = self.validator.validate(&records);
        info!(
            code,
            source = source.name(),
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            quality = report.quality_score,
            "Fetched bars"
        );

        if report.accepted.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use marketlens_cache::CacheConfig;
    use marketlens_core::types::RawQuote;
    use marketlens_core::MarketError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays scripted responses, then keeps failing.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<RawQuote>, DataError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<RawQuote>, DataError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedSource {
        async fn daily_quotes(
            &self,
            _code: &str,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<RawQuote>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DataError::Connection("down".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quotes() -> Vec<RawQuote> {
        vec![
            RawQuote::new("2024-01-04", "7203", 2500.0, 2550.0, 2480.0, 2520.0, 1000.0),
            RawQuote::new("2024-01-05", "7203", 2520.0, 2600.0, 2510.0, 2590.0, 1000.0),
            RawQuote::new("2024-01-06", "7203", 2590.0, 2500.0, 2600.0, 2550.0, 1000.0),
            RawQuote::new("2024-01-09", "7203", 2550.0, 2570.0, 2530.0, 2560.0, 1000.0),
        ]
    }

    fn adapter(source: Arc<ScriptedSource>) -> MarketDataAdapter {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            timeout: Duration::from_secs(1),
        };
        MarketDataAdapter::new(
            source,
            Arc::new(UnifiedCache::new(CacheConfig::default())),
            FreshnessManager::default(),
        )
        .with_retry_policy(policy)
        .with_rate_limiter(RateLimiter::new(Duration::from_millis(10)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_validates_and_caches() {
        let source = ScriptedSource::new(vec![Ok(quotes())]);
        let adapter = adapter(source.clone());
        let (from, to) = (ymd(2024, 1, 1), ymd(2024, 1, 31));

        let first = adapter.fetch_bars("7203", from, to).await.unwrap();
        assert_eq!(first.freshness.source, DataSource::Api);
        assert_eq!(first.bars.len(), 3);
        assert_eq!(first.quality, 75.0);

        let key = bars_cache_key("7203", from, to);
        let info = adapter.cache().entry_info(&key).unwrap();
        assert_eq!(info.tags, vec!["bars".to_string(), "code:7203".to_string()]);
        assert_eq!(info.priority, 0.75);

        let second = adapter.fetch_bars("7203", from, to).await.unwrap();
        assert_eq!(second.freshness.source, DataSource::Cache);
        assert_eq!(second.bars, first.bars);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let source = ScriptedSource::new(vec![
            Err(DataError::Http {
                status: 503,
                message: String::new(),
            }),
            Err(DataError::Connection("reset".into())),
            Ok(quotes()),
        ]);
        let adapter = adapter(source.clone());

        let outcome = adapter
            .fetch_bars("7203", ymd(2024, 1, 1), ymd(2024, 1, 31))
            .await
            .unwrap();
        assert_eq!(outcome.freshness.source, DataSource::Api);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_surfaces_without_cache() {
        let source = ScriptedSource::new(vec![Err(DataError::Http {
            status: 401,
            message: "unauthorized".into(),
        })]);
        let adapter = adapter(source.clone());

        let err = adapter
            .fetch_bars("7203", ymd(2024, 1, 1), ymd(2024, 1, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Data(DataError::Http { status: 401, .. })));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_copy_served_as_fallback() {
        let source = ScriptedSource::new(vec![]);
        let adapter = adapter(source.clone());
        let (from, to) = (ymd(2024, 1, 1), ymd(2024, 1, 31));

        let bars: Vec<PriceBar> = quotes()[..2]
            .iter()
            .map(|q| q.to_price_bar().unwrap())
            .collect();
        adapter.cache().set(
            bars_cache_key("7203", from, to),
            CachedBars {
                bars: bars.clone(),
                fetched_at: Utc::now() - ChronoDuration::hours(5),
                quality: 100.0,
            },
            SetOptions::default().with_ttl(Duration::from_secs(3600)),
        );

        let outcome = adapter.fetch_bars("7203", from, to).await.unwrap();
        assert_eq!(outcome.freshness.source, DataSource::Fallback);
        assert_eq!(outcome.freshness.status, FreshnessStatus::Expired);
        assert_eq!(outcome.bars, bars);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_copy_refreshed() {
        let source = ScriptedSource::new(vec![Ok(quotes())]);
        let adapter = adapter(source.clone());
        let (from, to) = (ymd(2024, 1, 1), ymd(2024, 1, 31));

        adapter.cache().set(
            bars_cache_key("7203", from, to),
            CachedBars {
                bars: Vec::new(),
                fetched_at: Utc::now() - ChronoDuration::hours(2),
                quality: 100.0,
            },
            SetOptions::default(),
        );

        let outcome = adapter.fetch_bars("7203", from, to).await.unwrap();
        assert_eq!(outcome.freshness.source, DataSource::Api);
        assert_eq!(outcome.bars.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_rejected_is_no_data() {
        let mut bad = quotes();
        for q in &mut bad {
            q.code = Some("ABC".into());
        }
        let adapter = adapter(ScriptedSource::new(vec![Ok(bad)]));

        let err = adapter
            .fetch_bars("7203", ymd(2024, 1, 1), ymd(2024, 1, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Data(DataError::NoDataAvailable)));
        assert!(adapter.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_by_code() {
        let source = ScriptedSource::new(vec![Ok(quotes()), Ok(quotes())]);
        let adapter = adapter(source.clone());

        adapter.fetch_bars("7203", ymd(2024, 1, 1), ymd(2024, 1, 31)).await.unwrap();
        assert_eq!(adapter.invalidate("7203"), 1);
        assert_eq!(adapter.invalidate("6758"), 0);

        adapter.fetch_bars("7203", ymd(2024, 1, 1), ymd(2024, 1, 31)).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    /// Slow upstream that records when each request starts.
    struct SlowSource {
        latency: Duration,
        fail_first: AtomicUsize,
        starts: Mutex<Vec<Instant>>,
    }

    impl SlowSource {
        fn new(latency: Duration, fail_first: usize) -> Arc<Self> {
            Arc::new(Self {
                latency,
                fail_first: AtomicUsize::new(fail_first),
                starts: Mutex::new(Vec::new()),
            })
        }

        fn starts(&self) -> Vec<Instant> {
            self.starts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PriceSource for SlowSource {
        async fn daily_quotes(
            &self,
            _code: &str,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<RawQuote>, DataError> {
            self.starts.lock().unwrap().push(Instant::now());
            let failing = self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(DataError::Http {
                    status: 503,
                    message: "busy".into(),
                });
            }
            tokio::time::sleep(self.latency).await;
            Ok(quotes())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn queued_adapter(source: Arc<SlowSource>, max_retries: u32) -> MarketDataAdapter {
        let policy = RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(50),
            timeout: Duration::from_secs(1),
        };
        MarketDataAdapter::new(
            source,
            Arc::new(UnifiedCache::new(CacheConfig::default())),
            FreshnessManager::default(),
        )
        .with_retry_policy(policy)
        .with_rate_limiter(RateLimiter::new(Duration::from_millis(100)))
    }

    fn assert_spaced(starts: &[Instant], min: Duration) {
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= min, "starts {:?}", starts);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_do_not_time_out_in_queue() {
        let source = SlowSource::new(Duration::from_millis(800), 0);
        let adapter = queued_adapter(source.clone(), 1);
        let (from, to) = (ymd(2024, 1, 1), ymd(2024, 1, 31));

        let (a, b, c) = tokio::join!(
            adapter.fetch_bars("7203", from, to),
            adapter.fetch_bars("6758", from, to),
            adapter.fetch_bars("9984", from, to),
        );

        // the last caller waits 1.6s in the queue for an 0.8s request
        for outcome in [a, b, c] {
            assert_eq!(outcome.unwrap().freshness.source, DataSource::Api);
        }
        let starts = source.starts();
        assert_eq!(starts.len(), 3);
        assert_spaced(&starts, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_rejoins_queue_behind_other_callers() {
        let source = SlowSource::new(Duration::from_millis(300), 1);
        let adapter = queued_adapter(source.clone(), 2);
        let (from, to) = (ymd(2024, 1, 1), ymd(2024, 1, 31));

        let (a, b, c) = tokio::join!(
            adapter.fetch_bars("7203", from, to),
            adapter.fetch_bars("6758", from, to),
            adapter.fetch_bars("9984", from, to),
        );

        for outcome in [a, b, c] {
            assert!(outcome.is_ok());
        }
        // one failed attempt plus one success per caller
        let starts = source.starts();
        assert_eq!(starts.len(), 4);
        assert_spaced(&starts, Duration::from_millis(100));
    }
}

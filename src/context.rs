//! Application context.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use marketlens_cache::{spawn_sweeper, SweeperHandle, UnifiedCache};
use marketlens_config::{load_config, AppConfig};
use marketlens_core::traits::PriceSource;
use marketlens_data::{CachedBars, MarketDataAdapter, RateLimiter, RecordValidator};
use marketlens_freshness::FreshnessManager;
use tracing::debug;

/// Everything a command needs, built once from configuration.
pub struct AppContext {
    pub config: AppConfig,
    pub cache: Arc<UnifiedCache<CachedBars>>,
    pub freshness: FreshnessManager,
    sweeper: Option<SweeperHandle>,
}

impl AppContext {
    /// Load and validate configuration, then build the shared services.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = load_config(config_path)
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
        Self::new(config)
    }

    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let freshness = FreshnessManager::new(config.freshness.thresholds())?;
        let cache = Arc::new(UnifiedCache::new(config.cache.clone()));
        debug!(
            max_entries = config.cache.max_entries,
            max_memory_bytes = config.cache.max_memory_bytes,
            "Cache ready"
        );

        Ok(Self {
            config,
            cache,
            freshness,
            sweeper: None,
        })
    }

    /// Start the periodic cache sweep. Needs a running tokio runtime.
    pub fn start_sweeper(&mut self) {
        if self.sweeper.is_none() {
            self.sweeper = Some(spawn_sweeper(&self.cache, self.config.cache.sweep_interval()));
        }
    }

    /// Adapter over `source` sharing this context's cache.
    pub fn adapter(&self, source: Arc<dyn PriceSource>) -> MarketDataAdapter {
        MarketDataAdapter::new(source, self.cache.clone(), self.freshness.clone())
            .with_rate_limiter(RateLimiter::new(self.config.api.min_request_interval()))
            .with_retry_policy(self.config.api.retry_policy())
            .with_validator(RecordValidator::new(self.config.validation))
            .with_config(self.config.freshness.adapter_config())
    }
}

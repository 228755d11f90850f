//! Configuration structures.

use marketlens_cache::CacheConfig;
use marketlens_core::types::ChartRange;
use marketlens_core::MarketError;
use marketlens_data::{AdapterConfig, JQuantsConfig, RetryPolicy, ValidationConfig};
use marketlens_freshness::FreshnessThresholds;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub freshness: FreshnessSettings,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub indicators: IndicatorSettings,
}

impl AppConfig {
    /// Check cross-field constraints. Reports every problem at once.
    pub fn validate(&self) -> Result<(), MarketError> {
        let mut problems = Vec::new();

        if let Err(e) = self.freshness.thresholds().validate() {
            problems.push(e.to_string());
        }
        if self.freshness.data_ttl_minutes == 0 {
            problems.push("freshness.data_ttl_minutes must be positive".to_string());
        }

        let cache = &self.cache;
        if cache.max_entries == 0 {
            problems.push("cache.max_entries must be positive".to_string());
        }
        if cache.max_entry_bytes == 0 || cache.max_entry_bytes > cache.max_memory_bytes {
            problems.push("cache.max_entry_bytes must be in (0, max_memory_bytes]".to_string());
        }
        let fraction = cache.eviction_fraction;
        if fraction.is_nan() || fraction <= 0.0 || fraction > 1.0 {
            problems.push(format!(
                "cache.eviction_fraction must be in (0, 1], got {}",
                cache.eviction_fraction
            ));
        }
        if cache.default_ttl_secs == 0 || cache.sweep_interval_secs == 0 {
            problems.push("cache TTL and sweep interval must be positive".to_string());
        }

        if self.api.timeout_secs == 0 {
            problems.push("api.timeout_secs must be positive".to_string());
        }
        if self.api.max_retries == 0 {
            problems.push("api.max_retries must be at least 1".to_string());
        }

        let limits = &self.validation;
        if limits.max_price.is_nan() || limits.max_price <= 0.0 || limits.max_volume < 0.0 {
            problems.push("validation limits must be positive".to_string());
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            problems.push(format!(
                "logging.format must be pretty or json, got {}",
                self.logging.format
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(MarketError::Config(problems.join("; ")))
        }
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, MarketError> {
        toml::to_string_pretty(self).map_err(|e| MarketError::Serialization(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "marketlens".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Environment variable holding the J-Quants ID token
    pub id_token_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub min_request_interval_ms: u64,
}

impl ApiSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// Client settings with the token read from the environment.
    pub fn jquants_config(&self) -> Result<JQuantsConfig, MarketError> {
        Ok(JQuantsConfig::from_env(
            &self.base_url,
            &self.id_token_env,
            Duration::from_secs(self.timeout_secs),
        )?)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: JQuantsConfig::DEFAULT_BASE_URL.to_string(),
            id_token_env: "JQUANTS_ID_TOKEN".to_string(),
            timeout_secs: 10,
            max_retries: 3,
            retry_delay_ms: 1000,
            min_request_interval_ms: 100,
        }
    }
}

/// Freshness thresholds and cached data lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessSettings {
    pub fresh_minutes: u32,
    pub stale_minutes: u32,
    pub expired_minutes: u32,
    /// Cached bars older than this are refetched
    pub data_ttl_minutes: u32,
    /// How long cached bars stay available as a fallback
    pub fallback_retention_hours: u64,
}

impl FreshnessSettings {
    pub fn thresholds(&self) -> FreshnessThresholds {
        FreshnessThresholds {
            fresh_minutes: self.fresh_minutes,
            stale_minutes: self.stale_minutes,
            expired_minutes: self.expired_minutes,
        }
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            data_ttl_minutes: self.data_ttl_minutes,
            retention: Duration::from_secs(self.fallback_retention_hours * 3600),
        }
    }
}

impl Default for FreshnessSettings {
    fn default() -> Self {
        let thresholds = FreshnessThresholds::default();
        Self {
            fresh_minutes: thresholds.fresh_minutes,
            stale_minutes: thresholds.stale_minutes,
            expired_minutes: thresholds.expired_minutes,
            data_ttl_minutes: 60,
            fallback_retention_hours: 24,
        }
    }
}

/// Indicator engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    /// Drop the in-progress session before computing
    pub exclude_today: bool,
    pub default_range: ChartRange,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            exclude_today: true,
            default_range: ChartRange::OneYear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.freshness.thresholds(), FreshnessThresholds::default());
        assert_eq!(config.api.retry_policy().base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[cache]"));

        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.cache.max_entries, config.cache.max_entries);
        assert_eq!(parsed.indicators.default_range, ChartRange::OneYear);
    }

    #[test]
    fn test_reports_all_problems() {
        let mut config = AppConfig::default();
        config.api.max_retries = 0;
        config.cache.max_entries = 0;
        config.logging.format = "xml".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("api.max_retries"));
        assert!(err.contains("cache.max_entries"));
        assert!(err.contains("logging.format"));
    }
}

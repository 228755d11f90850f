//! Freshness verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Age bucket of a piece of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessStatus {
    Fresh,
    Stale,
    Expired,
}

impl FreshnessStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FreshnessStatus::Fresh => "fresh",
            FreshnessStatus::Stale => "stale",
            FreshnessStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for FreshnessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Fetched live from the upstream API
    Api,
    Cache,
    /// Served from a cached copy after a failed fetch
    Fallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Api => "api",
            DataSource::Cache => "cache",
            DataSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(DataSource::Api),
            "cache" => Ok(DataSource::Cache),
            "fallback" => Ok(DataSource::Fallback),
            other => Err(format!(
                "unknown data source '{other}' (expected api, cache or fallback)"
            )),
        }
    }
}

/// Freshness of one data source at one moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataFreshnessInfo {
    pub last_updated: DateTime<Utc>,
    /// Whole minutes since `last_updated`, never negative
    pub age_minutes: i64,
    pub status: FreshnessStatus,
    pub source: DataSource,
    pub ttl_minutes: Option<u32>,
    /// `last_updated + ttl`, when a TTL is known
    pub next_refresh: Option<DateTime<Utc>>,
}

impl DataFreshnessInfo {
    pub fn is_fresh(&self) -> bool {
        self.status == FreshnessStatus::Fresh
    }
}

/// Health summary across sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    AllFresh,
    AllStale,
    AllExpired,
    Mixed,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverallStatus::AllFresh => "all_fresh",
            OverallStatus::AllStale => "all_stale",
            OverallStatus::AllExpired => "all_expired",
            OverallStatus::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedFreshness {
    pub overall_status: OverallStatus,
    pub fresh_count: usize,
    pub stale_count: usize,
    pub expired_count: usize,
    pub total_count: usize,
    /// Source with the greatest age
    pub oldest: Option<DataFreshnessInfo>,
}

//! Freshness classification and aggregation.

use chrono::{DateTime, Duration, Utc};
use marketlens_core::error::FreshnessError;
use serde::{Deserialize, Serialize};

use crate::status::{
    CombinedFreshness, DataFreshnessInfo, DataSource, FreshnessStatus, OverallStatus,
};
use crate::timestamp::Timestamp;

/// Age thresholds in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessThresholds {
    /// Up to this age data is fresh
    pub fresh_minutes: u32,
    /// Up to this age data is stale but recent
    pub stale_minutes: u32,
    /// Beyond this age data is expired
    pub expired_minutes: u32,
}

impl FreshnessThresholds {
    /// Thresholds must be strictly increasing.
    pub fn validate(&self) -> Result<(), FreshnessError> {
        if self.fresh_minutes >= self.stale_minutes || self.stale_minutes >= self.expired_minutes {
            return Err(FreshnessError::InvalidThresholds(format!(
                "expected fresh < stale < expired, got {} / {} / {}",
                self.fresh_minutes, self.stale_minutes, self.expired_minutes
            )));
        }
        Ok(())
    }

    /// Status from age alone.
    ///
    /// Ages between the stale and expired thresholds are still stale.
    pub fn classify(&self, age_minutes: i64) -> FreshnessStatus {
        if age_minutes <= i64::from(self.fresh_minutes) {
            FreshnessStatus::Fresh
        } else if age_minutes <= i64::from(self.expired_minutes) {
            FreshnessStatus::Stale
        } else {
            FreshnessStatus::Expired
        }
    }
}

impl Default for FreshnessThresholds {
    fn default() -> Self {
        Self {
            fresh_minutes: 15,
            stale_minutes: 60,
            expired_minutes: 240,
        }
    }
}

/// Classifies data age. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct FreshnessManager {
    thresholds: FreshnessThresholds,
}

impl FreshnessManager {
    pub fn new(thresholds: FreshnessThresholds) -> Result<Self, FreshnessError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &FreshnessThresholds {
        &self.thresholds
    }

    /// Freshness of data last updated at `last_updated`, as of now.
    pub fn freshness_info(
        &self,
        last_updated: impl Into<Timestamp>,
        source: DataSource,
        ttl_minutes: Option<u32>,
    ) -> Result<DataFreshnessInfo, FreshnessError> {
        self.freshness_info_at(last_updated, source, ttl_minutes, Utc::now())
    }

    /// Freshness as of `now`.
    ///
    /// Age past the TTL forces `Expired`; data from the API is always
    /// `Fresh`, whatever its age.
    pub fn freshness_info_at(
        &self,
        last_updated: impl Into<Timestamp>,
        source: DataSource,
        ttl_minutes: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<DataFreshnessInfo, FreshnessError> {
        let last_updated = last_updated.into().resolve()?;
        let age_minutes = (now - last_updated).num_minutes().max(0);

        let mut status = self.thresholds.classify(age_minutes);
        if let Some(ttl) = ttl_minutes {
            if age_minutes > i64::from(ttl) {
                status = FreshnessStatus::Expired;
            }
        }
        if source == DataSource::Api {
            status = FreshnessStatus::Fresh;
        }

        Ok(DataFreshnessInfo {
            last_updated,
            age_minutes,
            status,
            source,
            ttl_minutes,
            next_refresh: ttl_minutes.map(|ttl| last_updated + Duration::minutes(i64::from(ttl))),
        })
    }

    /// Fold many verdicts into one.
    ///
    /// An empty list counts as all expired.
    pub fn combined(&self, infos: &[DataFreshnessInfo]) -> CombinedFreshness {
        let count = |s: FreshnessStatus| infos.iter().filter(|i| i.status == s).count();
        let fresh_count = count(FreshnessStatus::Fresh);
        let stale_count = count(FreshnessStatus::Stale);
        let expired_count = count(FreshnessStatus::Expired);
        let total_count = infos.len();

        let overall_status = if expired_count == total_count {
            OverallStatus::AllExpired
        } else if fresh_count == total_count {
            OverallStatus::AllFresh
        } else if stale_count == total_count {
            OverallStatus::AllStale
        } else {
            OverallStatus::Mixed
        };

        let oldest = infos
            .iter()
            .fold(None::<&DataFreshnessInfo>, |oldest, info| match oldest {
                Some(o) if o.age_minutes >= info.age_minutes => Some(o),
                _ => Some(info),
            })
            .cloned();

        CombinedFreshness {
            overall_status,
            fresh_count,
            stale_count,
            expired_count,
            total_count,
            oldest,
        }
    }

    /// Whether the data should be fetched again.
    pub fn should_refresh(&self, info: &DataFreshnessInfo) -> bool {
        info.status != FreshnessStatus::Fresh
    }
}

/// Human-readable age.
pub fn relative_time(age_minutes: i64) -> String {
    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    }

    match age_minutes {
        m if m < 1 => "just now".to_string(),
        m if m < 60 => plural(m, "minute"),
        m if m < 1440 => plural(m / 60, "hour"),
        m => plural(m / 1440, "day"),
    }
}

//! Timestamps as callers hand them in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use marketlens_core::error::FreshnessError;
use std::convert::Infallible;
use std::str::FromStr;

/// A point in time in one of the shapes upstream code produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    DateTime(DateTime<Utc>),
    /// ISO 8601 text; offset-less values are read as UTC
    Iso(String),
    EpochMillis(i64),
}

impl Timestamp {
    pub fn resolve(&self) -> Result<DateTime<Utc>, FreshnessError> {
        match self {
            Timestamp::DateTime(dt) => Ok(*dt),
            Timestamp::EpochMillis(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| FreshnessError::InvalidTimestamp(ms.to_string())),
            Timestamp::Iso(text) => parse_iso(text)
                .ok_or_else(|| FreshnessError::InvalidTimestamp(text.clone())),
        }
    }
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let s = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::DateTime(dt)
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Timestamp::EpochMillis(ms)
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Timestamp::Iso(s.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(s: String) -> Self {
        Timestamp::Iso(s)
    }
}

/// All-digit input is epoch millis, anything else is ISO text.
impl FromStr for Timestamp {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(ms) => Ok(Timestamp::EpochMillis(ms)),
            Err(_) => Ok(Timestamp::Iso(s.to_string())),
        }
    }
}

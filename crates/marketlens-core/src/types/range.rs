//! Trailing chart windows.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailing window of a chart, measured back from the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChartRange {
    /// 1 month
    #[serde(rename = "1m")]
    OneMonth,
    /// 3 months
    #[serde(rename = "3m")]
    ThreeMonths,
    /// 1 year
    #[serde(rename = "1y")]
    #[default]
    OneYear,
    /// 5 years
    #[serde(rename = "5y")]
    FiveYears,
}

impl ChartRange {
    /// Length of the window in calendar months.
    pub fn months(&self) -> u32 {
        match self {
            ChartRange::OneMonth => 1,
            ChartRange::ThreeMonths => 3,
            ChartRange::OneYear => 12,
            ChartRange::FiveYears => 60,
        }
    }

    /// First day inside the window that ends on `end` (inclusive).
    pub fn start_from(&self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Get all available ranges.
    pub fn all() -> &'static [ChartRange] {
        &[
            ChartRange::OneMonth,
            ChartRange::ThreeMonths,
            ChartRange::OneYear,
            ChartRange::FiveYears,
        ]
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartRange::OneMonth => "1m",
            ChartRange::ThreeMonths => "3m",
            ChartRange::OneYear => "1y",
            ChartRange::FiveYears => "5y",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ChartRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "1mo" | "month" => Ok(ChartRange::OneMonth),
            "3m" | "3mo" | "quarter" => Ok(ChartRange::ThreeMonths),
            "1y" | "year" => Ok(ChartRange::OneYear),
            "5y" => Ok(ChartRange::FiveYears),
            _ => Err(format!("Invalid range: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_start() {
        let end = ymd(2024, 6, 15);
        assert_eq!(ChartRange::OneMonth.start_from(end), ymd(2024, 5, 15));
        assert_eq!(ChartRange::ThreeMonths.start_from(end), ymd(2024, 3, 15));
        assert_eq!(ChartRange::OneYear.start_from(end), ymd(2023, 6, 15));
        assert_eq!(ChartRange::FiveYears.start_from(end), ymd(2019, 6, 15));
    }

    #[test]
    fn test_range_start_clamps_month_end() {
        assert_eq!(ChartRange::OneMonth.start_from(ymd(2024, 3, 31)), ymd(2024, 2, 29));
    }

    #[test]
    fn test_range_parse() {
        assert_eq!(ChartRange::from_str("1m").unwrap(), ChartRange::OneMonth);
        assert_eq!(ChartRange::from_str("5Y").unwrap(), ChartRange::FiveYears);
        assert!(ChartRange::from_str("2w").is_err());
    }

    #[test]
    fn test_range_display() {
        for range in ChartRange::all() {
            assert_eq!(ChartRange::from_str(&range.to_string()).unwrap(), *range);
        }
    }
}

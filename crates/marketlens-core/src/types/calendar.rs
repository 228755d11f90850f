//! Tokyo trading calendar helpers.
//!
//! Every bar is anchored to the calendar day in the exchange timezone, so a
//! timestamp late in the UTC evening belongs to the next Tokyo day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Exchange timezone all daily bars are anchored to.
pub const MARKET_TZ: Tz = chrono_tz::Asia::Tokyo;

/// Current calendar day in the exchange timezone.
pub fn market_today() -> NaiveDate {
    market_date_of(Utc::now())
}

/// Calendar day in the exchange timezone for an instant.
pub fn market_date_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&MARKET_TZ).date_naive()
}

/// Epoch millis of midnight in the exchange timezone for a day.
pub fn market_midnight_millis(date: NaiveDate) -> i64 {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    MARKET_TZ
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

/// Parse a date string into an exchange calendar day.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, `YYYY-MM-DD HH:MM:SS`
/// (exchange local time) and RFC 3339 timestamps (converted to Tokyo).
pub fn parse_market_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(market_date_of(dt.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

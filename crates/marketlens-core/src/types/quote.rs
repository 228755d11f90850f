//! Upstream quote records before validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::{market_date_of, parse_market_date};
use super::price_bar::PriceBar;

/// A numeric field that upstream may send as a number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    /// Numeric value, if the field holds a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumberOrString::Number(n) => *n,
            NumberOrString::Text(s) => s.trim().replace(',', "").parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for NumberOrString {
    fn from(value: f64) -> Self {
        NumberOrString::Number(value)
    }
}

impl From<&str> for NumberOrString {
    fn from(value: &str) -> Self {
        NumberOrString::Text(value.to_string())
    }
}

/// A date field sent either as text or as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Millis(i64),
    Text(String),
}

impl DateValue {
    /// Exchange calendar day this value denotes.
    pub fn to_market_date(&self) -> Option<NaiveDate> {
        match self {
            DateValue::Millis(ms) => {
                DateTime::<Utc>::from_timestamp_millis(*ms).map(market_date_of)
            }
            DateValue::Text(s) => parse_market_date(s),
        }
    }
}

impl From<&str> for DateValue {
    fn from(value: &str) -> Self {
        DateValue::Text(value.to_string())
    }
}

/// A daily quote record as received from upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    #[serde(rename = "Date", alias = "date", default)]
    pub date: Option<DateValue>,
    #[serde(rename = "Code", alias = "code", default)]
    pub code: Option<String>,
    #[serde(rename = "Open", alias = "open", default)]
    pub open: Option<NumberOrString>,
    #[serde(rename = "High", alias = "high", default)]
    pub high: Option<NumberOrString>,
    #[serde(rename = "Low", alias = "low", default)]
    pub low: Option<NumberOrString>,
    #[serde(rename = "Close", alias = "close", default)]
    pub close: Option<NumberOrString>,
    #[serde(rename = "Volume", alias = "volume", default)]
    pub volume: Option<NumberOrString>,
}

impl RawQuote {
    /// Build a fully populated record.
    pub fn new(
        date: &str,
        code: &str,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date: Some(date.into()),
            code: Some(code.to_string()),
            open: Some(open.into()),
            high: Some(high.into()),
            low: Some(low.into()),
            close: Some(close.into()),
            volume: Some(volume.into()),
        }
    }

    /// Convert into a bar, reporting the first field that cannot be parsed.
    ///
    /// Only parsing happens here; range and OHLC checks belong to the
    /// validator.
    pub fn to_price_bar(&self) -> Result<PriceBar, String> {
        let date = match &self.date {
            None => return Err("missing date".to_string()),
            Some(value) => value
                .to_market_date()
                .ok_or_else(|| format!("unparseable date {:?}", value))?,
        };
        let code = self
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| "missing code".to_string())?;

        let field = |name: &str, value: &Option<NumberOrString>| -> Result<f64, String> {
            value
                .as_ref()
                .ok_or_else(|| format!("missing {}", name))?
                .as_f64()
                .ok_or_else(|| format!("non-numeric {}", name))
        };

        let open = field("open", &self.open)?;
        let high = field("high", &self.high)?;
        let low = field("low", &self.low)?;
        let close = field("close", &self.close)?;
        let volume = field("volume", &self.volume)?;
        if volume < 0.0 {
            return Err(format!("negative volume {}", volume));
        }
        if volume.fract() != 0.0 {
            return Err(format!("fractional volume {}", volume));
        }

        Ok(PriceBar::new(code, date, open, high, low, close, volume as u64))
    }

    pub fn market_date(&self) -> Option<NaiveDate> {
        self.date.as_ref().and_then(DateValue::to_market_date)
    }

    /// Raw date text for format checks. Epoch millis have no text form.
    pub fn date_text(&self) -> Option<&str> {
        match self.date.as_ref()? {
            DateValue::Text(s) => Some(s.as_str()),
            DateValue::Millis(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_mixed_fields() {
        let json = r#"{
            "Date": "2024-01-05",
            "Code": "72030",
            "Open": "2500.5",
            "High": 2550,
            "Low": null,
            "Close": "2,540",
            "Volume": 1200300
        }"#;
        let quote: RawQuote = serde_json::from_str(json).unwrap();

        assert_eq!(quote.code.as_deref(), Some("72030"));
        assert_eq!(quote.open.as_ref().and_then(NumberOrString::as_f64), Some(2500.5));
        assert_eq!(quote.high.as_ref().and_then(NumberOrString::as_f64), Some(2550.0));
        assert!(quote.low.is_none());
        assert_eq!(quote.close.as_ref().and_then(NumberOrString::as_f64), Some(2540.0));
        assert_eq!(quote.market_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn test_epoch_millis_date() {
        // 2024-01-04T15:00:00Z is midnight 2024-01-05 in Tokyo
        let quote = RawQuote {
            date: Some(DateValue::Millis(1_704_380_400_000)),
            ..Default::default()
        };
        assert_eq!(quote.market_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(quote.date_text(), None);
    }

    #[test]
    fn test_to_price_bar() {
        let bar = RawQuote::new("2024-01-05", "7203", 100.0, 110.0, 95.0, 105.0, 1500.0)
            .to_price_bar()
            .unwrap();
        assert_eq!(bar.code, "7203");
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(bar.volume, 1500);

        let mut quote = RawQuote::new("2024-01-05", "7203", 100.0, 110.0, 95.0, 105.0, 1.0);
        quote.volume = Some("1500.4".into());
        assert_eq!(quote.to_price_bar().unwrap_err(), "fractional volume 1500.4");

        let mut quote = RawQuote::new("2024-01-05", "7203", 100.0, 110.0, 95.0, 105.0, 1.0);
        quote.date = Some("yesterday".into());
        assert!(quote.to_price_bar().unwrap_err().contains("unparseable date"));

        let mut quote = RawQuote::new("2024-01-05", "7203", 100.0, 110.0, 95.0, 105.0, 1.0);
        quote.close = Some("n/a".into());
        assert_eq!(quote.to_price_bar().unwrap_err(), "non-numeric close");

        let mut quote = RawQuote::new("2024-01-05", "7203", 100.0, 110.0, 95.0, 105.0, 1.0);
        quote.code = Some("  ".into());
        assert_eq!(quote.to_price_bar().unwrap_err(), "missing code");
    }

    #[test]
    fn test_non_numeric_text() {
        assert_eq!(NumberOrString::from("abc").as_f64(), None);
        assert_eq!(NumberOrString::from(f64::NAN).as_f64(), None);
    }
}

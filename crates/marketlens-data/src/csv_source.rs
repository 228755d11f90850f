//! CSV price source.

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use marketlens_core::error::DataError;
use marketlens_core::traits::PriceSource;
use marketlens_core::types::{NumberOrString, RawQuote};
use serde::Deserialize;
use std::path::Path;

use crate::jquants::normalize_code;

/// CSV record format.
///
/// Fields stay textual; parsing and range checks happen downstream so a bad
/// row is reported instead of failing the whole file.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Code", alias = "code", alias = "symbol", default)]
    code: Option<String>,
    #[serde(alias = "Open", alias = "open", default)]
    open: Option<String>,
    #[serde(alias = "High", alias = "high", default)]
    high: Option<String>,
    #[serde(alias = "Low", alias = "low", default)]
    low: Option<String>,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close", default)]
    close: Option<String>,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: Option<String>,
}

impl CsvRecord {
    fn into_quote(self, default_code: &str) -> RawQuote {
        let text = |v: Option<String>| v.filter(|s| !s.trim().is_empty()).map(NumberOrString::Text);
        let code = self
            .code
            .filter(|c| !c.trim().is_empty())
            .map(|c| normalize_code(&c))
            .unwrap_or_else(|| default_code.to_string());

        RawQuote {
            date: Some(self.date.as_str().into()),
            code: Some(code),
            open: text(self.open),
            high: text(self.high),
            low: text(self.low),
            close: text(self.close),
            volume: text(self.volume),
        }
    }
}

/// Daily quotes read from a CSV file.
pub struct CsvPriceSource {
    path: String,
    default_code: String,
}

impl CsvPriceSource {
    pub fn new(path: &str, default_code: &str) -> Result<Self, DataError> {
        if !Path::new(path).exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_string(),
            default_code: normalize_code(default_code),
        })
    }

    /// Every record in the file, in file order.
    pub fn load_all(&self) -> Result<Vec<RawQuote>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut quotes = Vec::new();
        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            quotes.push(record.into_quote(&self.default_code));
        }

        Ok(quotes)
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    /// Records for `code` dated within `[from, to]`.
    ///
    /// Records whose date cannot be read are passed through for the
    /// validator to report.
    async fn daily_quotes(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataError> {
        let code = normalize_code(code);
        let quotes = self
            .load_all()?
            .into_iter()
            .filter(|q| q.code.as_deref() == Some(code.as_str()))
            .filter(|q| q.market_date().map_or(true, |d| d >= from && d <= to))
            .collect();
        Ok(quotes)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

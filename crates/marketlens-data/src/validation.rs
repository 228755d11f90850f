//! Upstream record validation.
//!
//! Checks each quote record for:
//! - required fields
//! - a parseable date
//! - a 4-digit security code
//! - prices in (0, max_price] and volume in [0, max_volume]
//! - OHLC consistency (high >= open/close >= low)

use marketlens_core::error::InvalidRecordError;
use marketlens_core::types::{NumberOrString, PriceBar, RawQuote};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Validator limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_price: f64,
    pub max_volume: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_price: 1_000_000.0,
            max_volume: 10_000_000_000.0,
        }
    }
}

/// Outcome of validating one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub accepted: Vec<PriceBar>,
    pub rejected: Vec<InvalidRecordError>,
    pub total: usize,
    /// Accepted share of the batch, 0 to 100; 0 for an empty batch
    pub quality_score: f64,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Record validator.
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    config: ValidationConfig,
}

impl RecordValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a batch, keeping the valid records as bars.
    pub fn validate(&self, records: &[RawQuote]) -> ValidationReport {
        let mut accepted = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match self.validate_record(record) {
                Ok(bar) => accepted.push(bar),
                Err(reasons) => rejected.push(InvalidRecordError {
                    index,
                    code: record.code.clone(),
                    reasons,
                }),
            }
        }

        let total = records.len();
        let quality_score = if total == 0 {
            0.0
        } else {
            accepted.len() as f64 / total as f64 * 100.0
        };

        if !rejected.is_empty() {
            warn!(
                rejected = rejected.len(),
                total,
                quality_score,
                "Rejected invalid quote records"
            );
        }

        ValidationReport {
            accepted,
            rejected,
            total,
            quality_score,
        }
    }

    /// Every failed check of one record, or the bar it describes.
    pub fn validate_record(&self, record: &RawQuote) -> Result<PriceBar, Vec<String>> {
        let mut reasons = Vec::new();

        match &record.date {
            None => reasons.push("missing date".to_string()),
            Some(date) if date.to_market_date().is_none() => {
                reasons.push(format!("invalid date format {:?}", date))
            }
            Some(_) => {}
        }

        match record.code.as_deref().map(str::trim) {
            None | Some("") => reasons.push("missing code".to_string()),
            Some(code) if !is_valid_code(code) => {
                reasons.push(format!("invalid code '{}': expected 4 digits", code))
            }
            Some(_) => {}
        }

        let open = self.price("open", &record.open, &mut reasons);
        let high = self.price("high", &record.high, &mut reasons);
        let low = self.price("low", &record.low, &mut reasons);
        let close = self.price("close", &record.close, &mut reasons);

        match numeric("volume", &record.volume) {
            Err(reason) => reasons.push(reason),
            Ok(v) if !(0.0..=self.config.max_volume).contains(&v) => reasons.push(format!(
                "volume {} outside [0, {}]",
                v, self.config.max_volume
            )),
            Ok(v) if v.fract() != 0.0 => {
                reasons.push(format!("volume {} is not a whole number", v))
            }
            Ok(_) => {}
        }

        if let (Some(o), Some(h), Some(l), Some(c)) = (open, high, low, close) {
            if h < l {
                reasons.push(format!("high {} below low {}", h, l));
            }
            if h < o.max(c) {
                reasons.push(format!("high {} below open/close", h));
            }
            if l > o.min(c) {
                reasons.push(format!("low {} above open/close", l));
            }
        }

        if !reasons.is_empty() {
            return Err(reasons);
        }
        record.to_price_bar().map_err(|reason| vec![reason])
    }

    fn price(
        &self,
        name: &str,
        value: &Option<NumberOrString>,
        reasons: &mut Vec<String>,
    ) -> Option<f64> {
        match numeric(name, value) {
            Err(reason) => {
                reasons.push(reason);
                None
            }
            Ok(p) if p <= 0.0 || p > self.config.max_price => {
                reasons.push(format!("{} {} outside (0, {}]", name, p, self.config.max_price));
                None
            }
            Ok(p) => Some(p),
        }
    }
}

fn numeric(name: &str, value: &Option<NumberOrString>) -> Result<f64, String> {
    value
        .as_ref()
        .ok_or_else(|| format!("missing {}", name))?
        .as_f64()
        .ok_or_else(|| format!("non-numeric {}", name))
}

/// Exactly four ASCII digits.
pub(crate) fn is_valid_code(code: &str) -> bool {
    code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit())
}

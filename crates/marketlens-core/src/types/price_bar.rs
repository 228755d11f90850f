//! Daily price bars and their indicator-enriched form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::market_midnight_millis;

/// One trading day's OHLCV for one symbol.
///
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Calendar day in the exchange timezone
    pub date: NaiveDate,
    /// Symbol code
    pub code: String,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded shares
    pub volume: u64,
}

impl PriceBar {
    /// Create a new bar.
    pub fn new(
        code: impl Into<String>,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            date,
            code: code.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Synthesize a bar for a day without trading.
    ///
    /// All prices carry this bar's close and volume is zero.
    pub fn flat_carry(&self, date: NaiveDate) -> Self {
        Self {
            date,
            code: self.code.clone(),
            open: self.close,
            high: self.close,
            low: self.close,
            close: self.close,
            volume: 0,
        }
    }

    /// Check the OHLC ordering invariant.
    pub fn is_consistent(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }

    /// Epoch millis of the bar's day boundary in the exchange timezone.
    pub fn timestamp_millis(&self) -> i64 {
        market_midnight_millis(self.date)
    }

    /// Calculate the true range (used for ATR).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }
}

/// A price bar plus the indicator values derived up to its day.
///
/// Each indicator is `None` until enough preceding bars exist to fill its
/// lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub sma_5: Option<f64>,
    pub sma_25: Option<f64>,
    pub sma_75: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub rsi_14: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub atr_14: Option<f64>,
    pub adx_14: Option<f64>,
}

impl EnrichedBar {
    /// Wrap a bar with no indicator values.
    pub fn new(bar: PriceBar) -> Self {
        Self {
            bar,
            sma_5: None,
            sma_25: None,
            sma_75: None,
            ema_12: None,
            ema_26: None,
            macd: None,
            macd_signal: None,
            macd_histogram: None,
            rsi_14: None,
            bollinger_upper: None,
            bollinger_middle: None,
            bollinger_lower: None,
            atr_14: None,
            adx_14: None,
        }
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    #[inline]
    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

impl From<PriceBar> for EnrichedBar {
    fn from(bar: PriceBar) -> Self {
        Self::new(bar)
    }
}

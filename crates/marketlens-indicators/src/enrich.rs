//! Indicator enrichment of daily series.

use chrono::NaiveDate;
use marketlens_core::error::InvalidRecordError;
use marketlens_core::traits::{Indicator, MultiOutputIndicator, OhlcvIndicator};
use marketlens_core::types::{market_today, EnrichedBar, PriceBar, RawQuote};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::momentum::{Macd, Rsi};
use crate::moving_average::{Ema, Sma};
use crate::series::{gap_fill, normalize};
use crate::trend::Adx;
use crate::volatility::{Atr, BollingerBands};

/// Options for [`enrich`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichOptions {
    /// Drop bars dated today or later; the current session is not final.
    pub exclude_today: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            exclude_today: true,
        }
    }
}

/// Gap-fill a daily series and attach indicator values.
///
/// `today` is the current exchange calendar day. With `exclude_today`, any
/// bar on or after it is dropped before anything is computed, so an
/// in-progress session never leaks into the output.
pub fn enrich(bars: &[PriceBar], options: &EnrichOptions, today: NaiveDate) -> Vec<EnrichedBar> {
    let finalized: Vec<PriceBar> = if options.exclude_today {
        bars.iter().filter(|b| b.date < today).cloned().collect()
    } else {
        bars.to_vec()
    };
    let excluded = bars.len() - finalized.len();
    if excluded > 0 {
        debug!(excluded, %today, "Dropped unfinalized bars");
    }

    let series = gap_fill(&finalized);
    let closes: Vec<f64> = series.iter().map(|b| b.close).collect();

    let sma_5 = Sma::new(5).calculate(&closes);
    let sma_25 = Sma::new(25).calculate(&closes);
    let sma_75 = Sma::new(75).calculate(&closes);
    let ema_12 = Ema::new(12).calculate(&closes);
    let ema_26 = Ema::new(26).calculate(&closes);
    let macd = Macd::new().calculate(&closes);
    let rsi = Rsi::new(14).calculate(&closes);
    let bollinger = BollingerBands::new().calculate(&closes);
    let atr = Atr::new(14).calculate(&series);
    let adx = Adx::new(14).calculate(&series);

    series
        .into_iter()
        .enumerate()
        .map(|(i, bar)| {
            let mut enriched = EnrichedBar::new(bar);
            enriched.sma_5 = sma_5[i];
            enriched.sma_25 = sma_25[i];
            enriched.sma_75 = sma_75[i];
            enriched.ema_12 = ema_12[i];
            enriched.ema_26 = ema_26[i];
            if let Some(m) = macd[i] {
                enriched.macd = Some(m.macd);
                enriched.macd_signal = m.signal;
                enriched.macd_histogram = m.histogram;
            }
            enriched.rsi_14 = rsi[i];
            if let Some(b) = bollinger[i] {
                enriched.bollinger_upper = Some(b.upper);
                enriched.bollinger_middle = Some(b.middle);
                enriched.bollinger_lower = Some(b.lower);
            }
            enriched.atr_14 = atr[i];
            enriched.adx_14 = adx[i].and_then(|d| d.adx);
            enriched
        })
        .collect()
}

/// [`enrich`] against the current exchange calendar day.
pub fn enrich_now(bars: &[PriceBar], options: &EnrichOptions) -> Vec<EnrichedBar> {
    enrich(bars, options, market_today())
}

/// Normalize upstream records and enrich the parseable ones.
pub fn enrich_quotes(
    records: &[RawQuote],
    options: &EnrichOptions,
    today: NaiveDate,
) -> (Vec<EnrichedBar>, Vec<InvalidRecordError>) {
    let (bars, invalid) = normalize(records);
    (enrich(&bars, options, today), invalid)
}

//! Gap-filled daily series and technical indicators.
//!
//! This crate provides:
//! - Series preparation (normalize, gap-fill, range slicing)
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (RSI, MACD)
//! - Volatility indicators (ATR, Bollinger Bands)
//! - Trend indicators (ADX with +DI/-DI)
//! - `enrich`, which runs all of the above over a daily series
//!
//! Every indicator returns output aligned with its input, `None` until the
//! lookback window is filled.

pub mod enrich;
pub mod momentum;
pub mod moving_average;
pub mod series;
pub mod trend;
pub mod volatility;

pub use enrich::{enrich, enrich_now, enrich_quotes, EnrichOptions};
pub use momentum::{Macd, MacdOutput, Rsi};
pub use moving_average::{ema_series, Ema, Sma};
pub use series::{gap_fill, normalize, slice_range, Dated};
pub use trend::{Adx, DmiOutput};
pub use volatility::{Atr, BollingerBands, BollingerOutput};

//! Core traits for the market data layer.

mod indicator;
mod price_source;

pub use indicator::{Indicator, MultiOutputIndicator, OhlcvIndicator};
pub use price_source::PriceSource;

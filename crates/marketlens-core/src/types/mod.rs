//! Core data types for the market data layer.

mod calendar;
mod price_bar;
mod quote;
mod range;

pub use calendar::{
    market_date_of, market_midnight_millis, market_today, parse_market_date, MARKET_TZ,
};
pub use price_bar::{EnrichedBar, PriceBar};
pub use quote::{DateValue, NumberOrString, RawQuote};
pub use range::ChartRange;

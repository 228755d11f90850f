//! Core types and traits for the market data layer.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (PriceBar, EnrichedBar, RawQuote)
//! - Chart ranges and Tokyo calendar helpers
//! - The error taxonomy shared by every crate
//! - Core traits for indicators and price sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{MarketError, MarketResult};
pub use types::*;
pub use traits::*;

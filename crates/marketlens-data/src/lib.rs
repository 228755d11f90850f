//! Market data acquisition.
//!
//! Price sources ([`JQuantsClient`], [`CsvPriceSource`]) sit behind the
//! [`PriceSource`](marketlens_core::traits::PriceSource) trait.
//! [`MarketDataAdapter`] puts rate limiting, retries, validation and caching
//! in front of any of them.

mod adapter;
mod csv_source;
mod jquants;
mod rate_limiter;
mod retry;
mod validation;

pub use adapter::{bars_cache_key, AdapterConfig, CachedBars, FetchOutcome, MarketDataAdapter};
pub use csv_source::CsvPriceSource;
pub use jquants::{normalize_code, JQuantsClient, JQuantsConfig};
pub use rate_limiter::RateLimiter;
pub use retry::{retry_through_limiter, retry_with_backoff, RetryPolicy};
pub use validation::{RecordValidator, ValidationConfig, ValidationReport};

use marketlens_core::error::DataError;
use marketlens_core::types::RawQuote;

/// Load every quote record from a CSV file.
///
/// `default_code` fills in records from files without a code column.
pub fn load_csv(path: &str, default_code: &str) -> Result<Vec<RawQuote>, DataError> {
    CsvPriceSource::new(path, default_code)?.load_all()
}

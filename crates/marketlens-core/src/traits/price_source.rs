//! Price source trait definitions.

use crate::error::DataError;
use crate::types::RawQuote;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for upstream sources of daily quotes.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch daily quote records.
    ///
    /// # Arguments
    /// * `code` - The symbol code to fetch
    /// * `from` - First day of the range (inclusive)
    /// * `to` - Last day of the range (inclusive)
    ///
    /// # Returns
    /// Unvalidated records in upstream order
    async fn daily_quotes(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataError>;

    /// Get the source name.
    fn name(&self) -> &str;
}

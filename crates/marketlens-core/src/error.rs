//! Error types for the market data layer.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Freshness error: {0}")]
    Freshness(#[from] FreshnessError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data source error: {0}")]
    Internal(String),
}

impl DataError {
    /// Whether retrying the same request can succeed.
    ///
    /// Network failures, timeouts, throttling and server-side errors are
    /// transient. Malformed payloads and client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Connection(_)
            | DataError::Timeout { .. }
            | DataError::RateLimited { .. } => true,
            DataError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DataError::Http { status, .. } => Some(*status),
            DataError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Cache errors.
///
/// None of these reach callers of `set`; they are logged and the write is
/// skipped.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to serialize entry '{key}': {message}")]
    Serialization { key: String, message: String },

    #[error("Entry '{key}' is {size} bytes, limit is {max} bytes")]
    EntryTooLarge { key: String, size: usize, max: usize },
}

/// Freshness classification errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FreshnessError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),
}

/// A single upstream record that could not be turned into a price bar.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("record {index} ({}) rejected: {}", .code.as_deref().unwrap_or("?"), .reasons.join("; "))]
pub struct InvalidRecordError {
    /// Position of the record in the input batch
    pub index: usize,
    /// Symbol code, when the record carried one
    pub code: Option<String>,
    /// Every check the record failed
    pub reasons: Vec<String>,
}

impl InvalidRecordError {
    pub fn new(index: usize, code: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            index,
            code,
            reasons: vec![reason.into()],
        }
    }
}

/// Result type alias for market data operations.
pub type MarketResult<T> = Result<T, MarketError>;

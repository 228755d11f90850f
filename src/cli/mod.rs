//! CLI definitions.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use marketlens_config::LoggingConfig;
use marketlens_core::types::ChartRange;
use marketlens_core::MarketError;
use marketlens_freshness::{DataSource, Timestamp};
use marketlens_monitor::LogFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "marketlens")]
#[command(
    author,
    version,
    about = "Cached, freshness-aware J-Quants market data with technical indicators"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level; overrides `logging.level`
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format; overrides `logging.format`
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Cli {
    /// Level and format for the subscriber: flags first, then `logging`.
    pub fn logging(&self, configured: &LoggingConfig) -> Result<(String, LogFormat), MarketError> {
        let level = match self.log_level {
            Some(level) => level.as_str().to_string(),
            None => configured.level.clone(),
        };
        let format = if self.json_logs {
            LogFormat::Json
        } else {
            configured.format.parse()?
        };
        Ok((level, format))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute indicators over daily bars from a CSV file
    Enrich(EnrichArgs),
    /// Fetch daily bars through the cache, rate limiter and validator
    Fetch(FetchArgs),
    /// Classify the freshness of a timestamp
    Freshness(FreshnessArgs),
    /// Validate configuration
    ValidateConfig(ValidateArgs),
}

#[derive(clap::Args)]
pub struct EnrichArgs {
    /// Data file (CSV)
    #[arg(long)]
    pub data: PathBuf,

    /// Security code
    #[arg(long)]
    pub code: String,

    /// Chart range (1m, 3m, 1y, 5y); defaults to the configured range
    #[arg(short, long)]
    pub range: Option<ChartRange>,

    /// Keep today's (unfinalized) bar
    #[arg(long)]
    pub include_today: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct FetchArgs {
    /// Security code
    #[arg(long)]
    pub code: String,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Read from a CSV file instead of the J-Quants API
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct FreshnessArgs {
    /// Last update: ISO 8601 or epoch milliseconds
    #[arg(long)]
    pub last_updated: Timestamp,

    /// Data source (api, cache, fallback)
    #[arg(long, default_value = "cache")]
    pub source: DataSource,

    /// TTL in minutes
    #[arg(long)]
    pub ttl: Option<u32>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Print the effective configuration
    #[arg(long)]
    pub show: bool,
}

//! Configuration management.

mod settings;

pub use settings::{
    ApiSettings, AppConfig, AppSettings, FreshnessSettings, IndicatorSettings, LoggingConfig,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables override the file, e.g.
/// `MARKETLENS__CACHE__MAX_ENTRIES=500`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("MARKETLENS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

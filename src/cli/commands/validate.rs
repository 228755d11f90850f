//! Validate configuration command.

use anyhow::Result;
use marketlens_config::load_config;
use std::path::Path;

use crate::cli::ValidateArgs;

pub async fn run(args: ValidateArgs, config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("API: {}", config.api.base_url);
    println!(
        "Cache: {} entries, {} MiB",
        config.cache.max_entries,
        config.cache.max_memory_bytes / (1024 * 1024)
    );
    println!(
        "Freshness: fresh <= {} min, stale <= {} min, expired > {} min",
        config.freshness.fresh_minutes,
        config.freshness.stale_minutes,
        config.freshness.expired_minutes
    );
    println!("Default range: {}", config.indicators.default_range);

    if args.show {
        println!();
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

//! marketlens CLI application.

mod cli;
mod context;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use marketlens_config::load_config;
use marketlens_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An unreadable file is reported by the command itself
    let configured = load_config(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    let (level, format) = cli.logging(&configured)?;
    setup_logging(&level, format)?;

    match cli.command {
        Commands::Enrich(args) => cli::commands::enrich::run(args, &cli.config).await,
        Commands::Fetch(args) => cli::commands::fetch::run(args, &cli.config).await,
        Commands::Freshness(args) => cli::commands::freshness::run(args, &cli.config).await,
        Commands::ValidateConfig(args) => cli::commands::validate::run(args, &cli.config).await,
    }
}

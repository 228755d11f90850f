//! Enrich command.

use anyhow::{Context, Result};
use marketlens_core::types::{market_today, EnrichedBar};
use marketlens_data::load_csv;
use marketlens_indicators::{enrich_quotes, slice_range, EnrichOptions};
use std::path::Path;
use tracing::{info, warn};

use crate::cli::{EnrichArgs, OutputFormat};
use crate::context::AppContext;

pub async fn run(args: EnrichArgs, config_path: &Path) -> Result<()> {
    let ctx = AppContext::load(config_path)?;
    let range = args.range.unwrap_or(ctx.config.indicators.default_range);
    let options = EnrichOptions {
        exclude_today: ctx.config.indicators.exclude_today && !args.include_today,
    };

    let path = args.data.to_string_lossy();
    let records = load_csv(&path, &args.code).with_context(|| format!("Failed to load {}", path))?;
    info!(records = records.len(), code = %args.code, "Loaded quote records");

    let (enriched, invalid) = enrich_quotes(&records, &options, market_today());
    for err in &invalid {
        warn!("{}", err);
    }

    let window = slice_range(&enriched, range);

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(window)?);
        }
        OutputFormat::Text => {
            println!(
                "{} | range {} | {} bars ({} skipped records)",
                args.code,
                range,
                window.len(),
                invalid.len()
            );
            println!();
            print_table(window);
        }
    }

    Ok(())
}

fn print_table(bars: &[EnrichedBar]) {
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8} {:>9} {:>9} {:>8} {:>6}",
        "Date",
        "Close",
        "SMA5",
        "SMA25",
        "SMA75",
        "EMA12",
        "RSI14",
        "MACD",
        "Signal",
        "ATR14",
        "ADX14"
    );
    println!("{}", "-".repeat(112));

    for bar in bars {
        println!(
            "{:<10} {:>10.1} {:>10} {:>10} {:>10} {:>10} {:>8} {:>9} {:>9} {:>8} {:>6}",
            bar.date().format("%Y-%m-%d"),
            bar.close(),
            cell(bar.sma_5, 1),
            cell(bar.sma_25, 1),
            cell(bar.sma_75, 1),
            cell(bar.ema_12, 1),
            cell(bar.rsi_14, 1),
            cell(bar.macd, 2),
            cell(bar.macd_signal, 2),
            cell(bar.atr_14, 1),
            cell(bar.adx_14, 1),
        );
    }
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

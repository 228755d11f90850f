//! Fetch command.

use anyhow::{bail, Context, Result};
use marketlens_core::traits::PriceSource;
use marketlens_data::{CsvPriceSource, JQuantsClient};
use marketlens_freshness::relative_time;
use marketlens_monitor::HealthReport;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::cli::{FetchArgs, OutputFormat};
use crate::context::AppContext;

pub async fn run(args: FetchArgs, config_path: &Path) -> Result<()> {
    if args.from > args.to {
        bail!("--from {} is after --to {}", args.from, args.to);
    }

    let mut ctx = AppContext::load(config_path)?;
    ctx.start_sweeper();

    let source: Arc<dyn PriceSource> = match &args.data {
        Some(path) => Arc::new(CsvPriceSource::new(&path.to_string_lossy(), &args.code)?),
        None => Arc::new(JQuantsClient::new(ctx.config.api.jquants_config()?)?),
    };
    let adapter = ctx.adapter(source);

    let outcome = adapter
        .fetch_bars(&args.code, args.from, args.to)
        .await
        .with_context(|| format!("Failed to fetch {} from {}", args.code, adapter.source_name()))?;

    let combined = ctx.freshness.combined(std::slice::from_ref(&outcome.freshness));
    let report = HealthReport::new(combined, ctx.cache.status(), ctx.cache.stats());

    match args.output {
        OutputFormat::Json => {
            let body = json!({
                "code": args.code,
                "bars": outcome.bars,
                "freshness": outcome.freshness,
                "quality": outcome.quality,
                "health": report,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            let f = &outcome.freshness;
            println!("{} {} .. {}", args.code, args.from, args.to);
            println!(
                "  {} bars via {} ({}, updated {})",
                outcome.bars.len(),
                f.source,
                f.status,
                relative_time(f.age_minutes)
            );
            println!("  Quality: {:.1}%", outcome.quality);
            if let Some(last) = outcome.bars.last() {
                println!(
                    "  Last:    {} O {:.1} H {:.1} L {:.1} C {:.1} V {}",
                    last.date, last.open, last.high, last.low, last.close, last.volume
                );
            }
            println!();
            println!("{}", report);
        }
    }

    Ok(())
}

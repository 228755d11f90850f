//! Freshness command.

use anyhow::Result;
use marketlens_freshness::relative_time;
use serde_json::json;
use std::path::Path;

use crate::cli::{FreshnessArgs, OutputFormat};
use crate::context::AppContext;

pub async fn run(args: FreshnessArgs, config_path: &Path) -> Result<()> {
    let ctx = AppContext::load(config_path)?;
    let info = ctx
        .freshness
        .freshness_info(args.last_updated, args.source, args.ttl)?;
    let refresh = ctx.freshness.should_refresh(&info);

    match args.output {
        OutputFormat::Json => {
            let body = json!({
                "info": info,
                "relative": relative_time(info.age_minutes),
                "should_refresh": refresh,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            println!("Status:        {}", info.status);
            println!("Source:        {}", info.source);
            println!("Last updated:  {} ({})", info.last_updated, relative_time(info.age_minutes));
            if let Some(next) = info.next_refresh {
                println!("Next refresh:  {}", next);
            }
            println!("Refresh now:   {}", if refresh { "yes" } else { "no" });
        }
    }

    Ok(())
}

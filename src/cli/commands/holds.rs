//! Implementation of the `ltd-meta holds` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::cli::display::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::{Config, Stats};
use crate::services::HoldsRequest;

#[derive(Args, Debug)]
pub struct HoldsArgs {
    /// Anchor unit id or name
    pub anchor: String,

    /// Wave number
    pub wave: u8,

    /// Game version (defaults to the newest recorded)
    #[arg(short, long)]
    pub version: Option<String>,

    /// Only holds that also contain this unit
    #[arg(short, long)]
    pub secondary: Option<String>,

    /// Maximum number of holds to display
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HoldsOutput {
    pub anchor_unit: String,
    pub wave: u8,
    pub holds: Vec<Stats>,
    pub total: usize,
}

impl CommandOutput for HoldsOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["#", "score", "value", "win%", "workers", "best send", "position"]);
        for (rank, stats) in self.holds.iter().enumerate() {
            let best = stats
                .best_send
                .as_ref()
                .map_or_else(|| "-".to_string(), |s| format!("{} ({:.0})", s.sends, s.score));
            table.add_row(vec![
                (rank + 1).to_string(),
                stats.score.to_string(),
                stats.total_value.to_string(),
                stats.win_rate.to_string(),
                format!("{:.1}", stats.workers),
                truncate(&best, 40),
                truncate(&stats.position, 48),
            ]);
        }
        render_list(&format!("wave {} hold", self.wave), &table, self.total)
    }
}

pub async fn execute(args: HoldsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let service = ctx.meta_service().await?;

    let request = HoldsRequest {
        anchor_unit: args.anchor,
        wave: args.wave,
        version: args.version,
        secondary: args.secondary,
    };
    let ranked = service
        .top_holds(&request)
        .await
        .with_context(|| format!("Failed to rank holds for {} wave {}", request.anchor_unit, request.wave))?;

    let holds: Vec<Stats> = ranked
        .iter()
        .take(args.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    let total = holds.len();
    output(
        &HoldsOutput {
            anchor_unit: request.anchor_unit,
            wave: request.wave,
            holds,
            total,
        },
        json_mode,
    );
    Ok(())
}

//! Implementation of the `ltd-meta ingest` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::adapters::ltdapi::LtdApiClient;
use crate::adapters::memory::InMemoryHoldRepository;
use crate::cli::display::{action_success, create_spinner, output, CommandOutput};
use crate::domain::models::{Config, UnitCatalog};
use crate::domain::ports::HoldRepository;
use crate::services::{Aggregator, IngestOptions, IngestPipeline, IngestReport};

/// Timestamp layout accepted by the game API's `dateAfter` parameter.
const API_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Only fetch games played after this date (defaults to 24 hours ago)
    #[arg(short, long)]
    pub date_after: Option<String>,

    /// Stop after this many pages
    #[arg(short, long)]
    pub pages: Option<u32>,

    /// Number of concurrent fetch workers (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Aggregate into memory only; nothing is written to the database
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub date_after: String,
    pub dry_run: bool,
    #[serde(flatten)]
    pub report: IngestReport,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        let r = &self.report;
        let headline = if self.dry_run {
            format!("Dry run over games after {}", self.date_after)
        } else {
            format!("Ingested games after {}", self.date_after)
        };
        let mut lines = vec![action_success(&headline)];
        lines.push(format!("  Pages:         {} ({} window(s))", r.pages, r.windows));
        lines.push(format!("  Games:         {}", r.games));
        lines.push(format!("  Observations:  {}", r.observations));
        lines.push(format!(
            "  Recorded:      {} ({} new hold(s))",
            r.aggregate.recorded, r.aggregate.new_holds
        ));
        lines.push(format!("  Skipped:       {}", r.aggregate.skipped));
        if r.aggregate.failed > 0 {
            lines.push(format!("  Failed:        {}", r.aggregate.failed));
        }
        if let Some(last) = &r.last_date {
            lines.push(format!("  Resume after:  {last}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: IngestArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(workers) = args.workers {
        config.ingest.workers = workers;
    }

    let ctx = AppContext::open(&config).await?;
    let catalog = ctx.catalog().await?;
    let client = LtdApiClient::new(&config.api, &config.retry, config.ingest.creatures_per_wave)
        .context("Failed to build game API client")?;

    let date_after = args
        .date_after
        .clone()
        .unwrap_or_else(|| (Utc::now() - Duration::days(1)).format(API_DATE_FORMAT).to_string());
    let options = IngestOptions {
        date_after: date_after.clone(),
        max_pages: args.pages,
    };

    let report = if args.dry_run {
        let memory = Arc::new(InMemoryHoldRepository::new());
        for table in ctx.holds.list_tables().await? {
            memory.provision(&table).await?;
        }
        run_pipeline(client, memory, catalog, &config, &options, json_mode).await?
    } else {
        run_pipeline(client, ctx.holds.clone(), catalog, &config, &options, json_mode).await?
    };

    output(
        &IngestOutput {
            date_after,
            dry_run: args.dry_run,
            report,
        },
        json_mode,
    );
    Ok(())
}

async fn run_pipeline<R: HoldRepository + 'static>(
    client: LtdApiClient,
    repository: Arc<R>,
    catalog: Arc<UnitCatalog>,
    config: &Config,
    options: &IngestOptions,
    json_mode: bool,
) -> Result<IngestReport> {
    let aggregator = Arc::new(Aggregator::new(repository, catalog, config.ingest.clone()));
    let pipeline = IngestPipeline::new(Arc::new(client), aggregator, &config.api, &config.ingest)
        .with_progress(create_spinner(json_mode));
    pipeline.run(options).await.context("Ingestion failed")
}

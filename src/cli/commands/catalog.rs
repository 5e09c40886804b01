//! Implementation of the `ltd-meta catalog` commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::AppContext;
use crate::adapters::ltdapi::LtdApiClient;
use crate::cli::display::{action_success, list_table, output, render_list, CommandOutput};
use crate::domain::models::{Config, Mercenary, Unit};
use crate::services::{CatalogSync, SyncReport};

#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// Download the unit list of a game version into the catalog
    Sync {
        /// Game version (defaults to the newest published)
        #[arg(short, long)]
        version: Option<String>,
    },
    /// List catalog units
    Show {
        /// List mercenaries instead of fighters
        #[arg(short, long)]
        mercenaries: bool,

        /// Only list usable units
        #[arg(short, long)]
        usable: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct SyncOutput {
    #[serde(flatten)]
    pub report: SyncReport,
}

impl CommandOutput for SyncOutput {
    fn to_human(&self) -> String {
        let r = &self.report;
        let mut lines = vec![action_success(&format!("Catalog synced for {}", r.version))];
        lines.push(format!("  Units:        {}", r.units));
        lines.push(format!("  Mercenaries:  {}", r.mercenaries));
        lines.push(format!("  Upgrades:     {}", r.upgrades));
        if r.special_units > 0 {
            lines.push(format!("  Seeded:       {}", r.special_units));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct UnitListOutput {
    pub units: Vec<Unit>,
    pub total: usize,
}

impl CommandOutput for UnitListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "value", "usable", "version"]);
        for unit in &self.units {
            table.add_row(vec![
                unit.unit_id.clone(),
                unit.name.clone(),
                unit.total_value.to_string(),
                if unit.usable { "yes" } else { "no" }.to_string(),
                unit.version.clone(),
            ]);
        }
        render_list("unit", &table, self.total)
    }
}

#[derive(Debug, Serialize)]
pub struct MercenaryListOutput {
    pub mercenaries: Vec<Mercenary>,
    pub total: usize,
}

impl CommandOutput for MercenaryListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "mythium", "income", "adjusted"]);
        for merc in &self.mercenaries {
            table.add_row(vec![
                merc.unit_id.clone(),
                merc.name.clone(),
                merc.mythium_cost.to_string(),
                merc.income_bonus.to_string(),
                format!("{:.1}", merc.adjusted_mythium()),
            ]);
        }
        render_list("mercenary", &table, self.total)
    }
}

pub async fn execute(args: CatalogArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        CatalogCommands::Sync { version } => {
            let client = LtdApiClient::new(&config.api, &config.retry, config.ingest.creatures_per_wave)
                .context("Failed to build game API client")?;
            let sync = CatalogSync::new(Arc::new(client), ctx.catalog_repository.clone(), &config.catalog);
            let report = sync
                .sync(version.as_deref())
                .await
                .context("Catalog sync failed")?;
            output(&SyncOutput { report }, json_mode);
        }
        CatalogCommands::Show { mercenaries, usable } => {
            let catalog = ctx.catalog().await?;
            if mercenaries {
                let mercenaries: Vec<Mercenary> = catalog.mercenaries().into_iter().cloned().collect();
                let total = mercenaries.len();
                output(&MercenaryListOutput { mercenaries, total }, json_mode);
            } else {
                let units: Vec<Unit> = if usable {
                    catalog.usable_units().into_iter().cloned().collect()
                } else {
                    catalog.units().into_iter().cloned().collect()
                };
                let total = units.len();
                output(&UnitListOutput { units, total }, json_mode);
            }
        }
    }

    Ok(())
}

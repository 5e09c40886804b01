//! Implementation of the `ltd-meta provision` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::cli::display::{action_success, output, CommandOutput};
use crate::domain::models::Config;
use crate::services::provisionable_waves;

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// First wave to provision
    #[arg(long, default_value_t = 1)]
    pub from: u8,

    /// Last wave to provision (inclusive)
    #[arg(long, default_value_t = 8)]
    pub to: u8,
}

#[derive(Debug, Serialize)]
pub struct ProvisionOutput {
    pub from: u8,
    pub to: u8,
    pub tables_created: usize,
}

impl CommandOutput for ProvisionOutput {
    fn to_human(&self) -> String {
        action_success(&format!(
            "Provisioned waves {}-{}: {} new table(s)",
            self.from, self.to, self.tables_created
        ))
    }
}

pub async fn execute(args: ProvisionArgs, config: &Config, json_mode: bool) -> Result<()> {
    let allowed = provisionable_waves();
    if args.from > args.to || !allowed.contains(&args.from) || !allowed.contains(&args.to) {
        anyhow::bail!(
            "Invalid wave range {}-{}; waves must lie within {}-{}",
            args.from,
            args.to,
            allowed.start(),
            allowed.end()
        );
    }

    let ctx = AppContext::open(config).await?;
    let service = ctx.meta_service().await?;
    let tables_created = service
        .provision(args.from..=args.to)
        .await
        .context("Provisioning failed")?;

    output(
        &ProvisionOutput {
            from: args.from,
            to: args.to,
            tables_created,
        },
        json_mode,
    );
    Ok(())
}

//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    catalog::CatalogArgs, guides::GuidesArgs, holds::HoldsArgs, ingest::IngestArgs, init::InitArgs,
    provision::ProvisionArgs,
};

#[derive(Parser, Debug)]
#[command(name = "ltd-meta")]
#[command(about = "ltd-meta - Legion TD 2 hold statistics and build guides", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and database
    Init(InitArgs),

    /// Unit catalog commands
    Catalog(CatalogArgs),

    /// Create hold tables for every usable unit
    Provision(ProvisionArgs),

    /// Fetch recent games and aggregate them into holds
    Ingest(IngestArgs),

    /// Rank the best holds of one anchor unit and wave
    Holds(HoldsArgs),

    /// Compose multi-wave build guides
    Guides(GuidesArgs),

    /// List recorded game versions
    Versions,
}

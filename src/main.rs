//! ltd-meta CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use ltd_meta::cli::commands::{catalog, guides, holds, ingest, init, provision, versions};
use ltd_meta::cli::{handle_error, Cli, Commands};
use ltd_meta::infrastructure::config::ConfigLoader;
use ltd_meta::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    match cli.command {
        Commands::Init(args) => init::execute(args, cli.json).await,
        Commands::Catalog(args) => catalog::execute(args, &config, cli.json).await,
        Commands::Provision(args) => provision::execute(args, &config, cli.json).await,
        Commands::Ingest(args) => ingest::execute(args, &config, cli.json).await,
        Commands::Holds(args) => holds::execute(args, &config, cli.json).await,
        Commands::Guides(args) => guides::execute(args, &config, cli.json).await,
        Commands::Versions => versions::execute(&config, cli.json).await,
    }
}

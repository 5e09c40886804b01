//! Implementation of the `ltd-meta versions` command.

use anyhow::{Context, Result};
use serde::Serialize;

use super::AppContext;
use crate::cli::display::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
pub struct VersionsOutput {
    /// Newest first
    pub versions: Vec<String>,
}

impl CommandOutput for VersionsOutput {
    fn to_human(&self) -> String {
        if self.versions.is_empty() {
            return "No versions recorded yet.".to_string();
        }
        let mut lines = vec!["Recorded versions (newest first):".to_string()];
        lines.extend(self.versions.iter().map(|v| format!("  {v}")));
        lines.join("\n")
    }
}

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let service = ctx.meta_service().await?;
    let versions = service.versions().await.context("Failed to list versions")?;
    output(&VersionsOutput { versions }, json_mode);
    Ok(())
}

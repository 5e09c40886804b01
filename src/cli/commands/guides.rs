//! Implementation of the `ltd-meta guides` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::cli::display::{output, CommandOutput, DetailView};
use crate::domain::models::{Config, Guide, UnitCatalog};

#[derive(Args, Debug)]
pub struct GuidesArgs {
    /// Game version (defaults to the newest recorded)
    #[arg(short, long)]
    pub version: Option<String>,

    /// Maximum number of guides to display
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GuidesOutput {
    pub guides: Vec<Guide>,
    pub total: usize,
    /// Display names keyed by unit id, for human output only
    #[serde(skip)]
    names: Vec<(String, String)>,
}

impl GuidesOutput {
    fn new(guides: Vec<Guide>, catalog: &UnitCatalog) -> Self {
        let names = guides
            .iter()
            .flat_map(|g| [Some(&g.main_unit), g.secondary_unit.as_ref()])
            .flatten()
            .filter_map(|id| catalog.unit(id).map(|u| (id.clone(), u.name.clone())))
            .collect();
        Self {
            total: guides.len(),
            guides,
            names,
        }
    }

    fn name<'a>(&'a self, unit_id: &'a str) -> &'a str {
        self.names
            .iter()
            .find(|(id, _)| id == unit_id)
            .map_or(unit_id, |(_, name)| name.as_str())
    }

    fn render_guide(&self, rank: usize, guide: &Guide) -> String {
        let title = match &guide.secondary_unit {
            Some(secondary) => format!(
                "#{rank} {} + {}",
                self.name(&guide.main_unit),
                self.name(secondary)
            ),
            None => format!("#{rank} {}", self.name(&guide.main_unit)),
        };
        let mut view = DetailView::new(&title)
            .field("Archetype", guide.archetype.as_str())
            .field("Score", guide.score)
            .field("Win rate", format!("{}%", guide.win_rate))
            .field("Workers", format!("{:.1}", guide.workers))
            .section("Waves");
        for wave in &guide.waves {
            let send = wave
                .best_send
                .as_ref()
                .map_or_else(|| "no sends".to_string(), |s| s.sends.clone());
            view = view.item(format!(
                "{:>2}: score {:>5}  value {:>5}  {}  [{}]",
                wave.wave, wave.score, wave.value, wave.position, send
            ));
        }
        view.render()
    }
}

impl CommandOutput for GuidesOutput {
    fn to_human(&self) -> String {
        if self.guides.is_empty() {
            return "No guides found.".to_string();
        }
        self.guides
            .iter()
            .enumerate()
            .map(|(i, g)| self.render_guide(i + 1, g))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub async fn execute(args: GuidesArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let service = ctx.meta_service().await?;

    let mut guides = service
        .generate_guides(args.version.as_deref())
        .await
        .context("Guide generation failed")?;
    if let Some(limit) = args.limit {
        guides.truncate(limit);
    }

    output(&GuidesOutput::new(guides, service.catalog()), json_mode);
    Ok(())
}

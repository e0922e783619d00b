//! List Command

use std::path::PathBuf;

use anyhow::Result;
use booking_e2e::Scenario;
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output::{print_list, TableDisplay};

#[derive(Args)]
pub struct ListArgs {
    /// Only scenarios with this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Load scenarios from this directory instead of the built-in catalog
    #[arg(long)]
    pub scenarios: Option<PathBuf>,
}

/// Scenario display wrapper for serialization
#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub steps: usize,
    pub assertions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_defect: Option<String>,
}

impl From<&Scenario> for ScenarioDisplay {
    fn from(s: &Scenario) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            tags: s.tags.clone(),
            steps: s.steps.len(),
            assertions: s.assertions.len(),
            known_defect: s.known_defect.clone(),
        }
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Tags", "Steps", "Checks", "Known Defect"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.tags.join(", "),
            self.steps.to_string(),
            self.assertions.to_string(),
            if self.known_defect.is_some() { "yes" } else { "" }.to_string(),
        ]
    }
}

pub fn execute(args: ListArgs, ctx: Context) -> Result<()> {
    let scenarios = ctx.scenarios(args.scenarios.as_deref())?;

    let displays: Vec<ScenarioDisplay> = scenarios
        .iter()
        .filter(|s| args.tag.as_deref().map_or(true, |tag| s.has_tag(tag)))
        .map(ScenarioDisplay::from)
        .collect();

    print_list(&displays, ctx.format);
    Ok(())
}

//! Show Command

use std::path::PathBuf;

use anyhow::Result;
use booking_e2e::catalog;
use clap::Args;

use super::Context;
use crate::output::print_document;

#[derive(Args)]
pub struct ShowArgs {
    /// Scenario ID, e.g. TC010
    pub id: String,

    /// Load scenarios from this directory instead of the built-in catalog
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Keep `@alias` locators instead of resolving them
    #[arg(long)]
    pub raw: bool,
}

pub fn execute(args: ShowArgs, ctx: Context) -> Result<()> {
    let scenarios = ctx.scenarios(args.scenarios.as_deref())?;
    let scenario = catalog::select(scenarios, &[args.id])?.remove(0);

    if args.raw {
        print_document(&scenario, ctx.format);
    } else {
        let pages = ctx.config.page_map();
        print_document(&scenario.resolved(&pages)?, ctx.format);
    }
    Ok(())
}

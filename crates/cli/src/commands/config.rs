//! Config Command

use anyhow::Result;

use super::Context;
use crate::output::{print_document, OutputFormat};

pub fn execute(ctx: Context) -> Result<()> {
    match ctx.format {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&ctx.config, ctx.format),
        _ => print!("{}", ctx.config.to_toml()?),
    }
    Ok(())
}

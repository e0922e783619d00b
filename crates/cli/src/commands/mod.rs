//! CLI Commands

use std::path::Path;

use anyhow::{Context as _, Result};
use booking_e2e::{catalog, RunnerConfig, Scenario};

use crate::output::OutputFormat;

pub mod check;
pub mod config;
pub mod list;
pub mod run;
pub mod show;

/// Settings shared by every subcommand
pub struct Context {
    pub config: RunnerConfig,
    pub format: OutputFormat,
}

impl Context {
    /// Read the config file and apply global overrides
    pub fn load(path: &Path, base_url: Option<&str>, format: OutputFormat) -> Result<Self> {
        let mut config = RunnerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;

        if let Some(url) = base_url {
            config.base_url = url.to_string();
            config.validate()?;
        }

        Ok(Self { config, format })
    }

    /// Scenarios from `dir`, the configured directory, or the built-in catalog
    pub fn scenarios(&self, dir: Option<&Path>) -> Result<Vec<Scenario>> {
        let dir = dir.or(self.config.scenarios_dir.as_deref());
        let scenarios = catalog::load(dir).with_context(|| match dir {
            Some(dir) => format!("loading scenarios from {}", dir.display()),
            None => "loading built-in scenarios".to_string(),
        })?;
        Scenario::ensure_unique_ids(&scenarios)?;
        Ok(scenarios)
    }
}

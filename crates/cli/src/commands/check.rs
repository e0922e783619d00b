//! Check Command

use std::time::Duration;

use anyhow::Result;
use booking_e2e::app;
use booking_e2e::playwright::PlaywrightLauncher;
use serde::Serialize;

use super::Context;
use crate::output::{print_list, TableDisplay};

/// One readiness check result
#[derive(Serialize)]
pub struct CheckDisplay {
    pub check: String,
    pub target: String,
    pub ok: bool,
    pub detail: String,
}

impl TableDisplay for CheckDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Check", "Target", "OK", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.check.clone(),
            self.target.clone(),
            if self.ok { "✓" } else { "✗" }.to_string(),
            self.detail.clone(),
        ]
    }
}

pub async fn execute(ctx: Context) -> Result<bool> {
    let config = &ctx.config;
    let mut checks = Vec::new();

    let client = app::probe_client(Duration::from_secs(5))?;
    let app_check = match app::probe(&client, &config.base_url).await {
        Ok(status) => CheckDisplay {
            check: "app".into(),
            target: config.base_url.clone(),
            ok: true,
            detail: status.to_string(),
        },
        Err(e) => CheckDisplay {
            check: "app".into(),
            target: config.base_url.clone(),
            ok: false,
            detail: e.to_string(),
        },
    };
    checks.push(app_check);

    let node = &config.browser.node_binary;
    let node_check = match PlaywrightLauncher::check_node(node).await {
        Ok(version) => CheckDisplay {
            check: "node".into(),
            target: node.display().to_string(),
            ok: true,
            detail: version,
        },
        Err(e) => CheckDisplay {
            check: "node".into(),
            target: node.display().to_string(),
            ok: false,
            detail: e.to_string(),
        },
    };
    checks.push(node_check);

    print_list(&checks, ctx.format);
    Ok(checks.iter().all(|c| c.ok))
}

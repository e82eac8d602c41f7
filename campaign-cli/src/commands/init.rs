//! `campaign-sync init` — write the config template.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use campaign_core::config;

/// Write a commented config template.
#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let path = config::init(config_path).context("failed to write config template")?;
        println!("✓ Wrote config template to {}", path.display());
        println!("  Fill in the API keys and table id, or export BREVO_API_KEY, NOCODB_API_KEY and NOCODB_TABLE_ID.");
        Ok(())
    }
}

//! `campaign-sync verify` — check access to the destination table.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use campaign_sync::NocoDbClient;

use crate::logging;

/// Arguments for `campaign-sync verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {}

impl VerifyArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = super::load_config(config_path)?;
        logging::init(None)?;

        let store = NocoDbClient::new(&config.store, &config.sync);
        store
            .verify()
            .with_context(|| format!("table not reachable at {}", store.records_url()))?;
        println!("✓ Table reachable: {}", store.records_url());
        Ok(())
    }
}

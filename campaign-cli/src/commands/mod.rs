pub mod campaigns;
pub mod init;
pub mod sync;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use campaign_core::{config, Config};

/// Resolve configuration from the environment and the config file.
pub(crate) fn load_config(config_path: Option<&Path>) -> Result<Config> {
    config::resolve(config_path)
        .context("failed to load configuration — run `campaign-sync init` or set the environment variables")
}

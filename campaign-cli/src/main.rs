//! campaign-sync — mirror email campaigns into a database table.
//!
//! # Usage
//!
//! ```text
//! campaign-sync init
//! campaign-sync sync [--dry-run]
//! campaign-sync campaigns [<id>] [--json | --csv <path>]
//! campaign-sync verify
//! campaign-sync --config <path> <command>
//! ```
//!
//! `sync` is meant to be invoked by an external scheduler (cron, launchd).
//! Overlapping invocations are not prevented.

mod commands;
mod log_rotation;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{campaigns::CampaignsArgs, init::InitArgs, sync::SyncArgs, verify::VerifyArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "campaign-sync",
    version,
    about = "Sync email campaign statistics from Brevo into a NocoDB table",
    long_about = None,
)]
struct Cli {
    /// Config file to read instead of ~/.campaign-sync/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a config template to ~/.campaign-sync/config.yaml.
    Init(InitArgs),

    /// Fetch campaigns and create or update their table rows.
    Sync(SyncArgs),

    /// List campaigns with their statistics, without writing anything.
    Campaigns(CampaignsArgs),

    /// Check that the destination table is reachable.
    Verify(VerifyArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init(args) => args.run(config),
        Commands::Sync(args) => args.run(config),
        Commands::Campaigns(args) => args.run(config),
        Commands::Verify(args) => args.run(config),
    }
}

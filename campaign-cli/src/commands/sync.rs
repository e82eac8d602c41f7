//! `campaign-sync sync` — one synchronization pass.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use campaign_sync::{BrevoClient, NocoDbClient, Orchestrator, RunStatus, SyncOptions, SyncReport};

use crate::logging;

/// Arguments for `campaign-sync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Classify campaigns and show what would be written, without writing.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = super::load_config(config_path)?;
        logging::init(Some(&config.log.file))?;
        tracing::debug!(source = ?config.source, store = ?config.store, "resolved configuration");

        let source = BrevoClient::new(&config.source, &config.sync);
        let store = NocoDbClient::new(&config.store, &config.sync);
        let options = SyncOptions {
            dry_run: self.dry_run,
            write_delay: config.sync.write_delay,
        };
        let orchestrator = Orchestrator::new(
            source,
            store,
            config.source.campaign_url_base.clone(),
            options,
        );

        let report = orchestrator.run().context("campaign sync failed")?;
        print_report(&report);

        if report.status() == RunStatus::Failed {
            bail!("{} record write(s) failed", report.failed());
        }
        Ok(())
    }
}

fn print_report(report: &SyncReport) {
    println!("{}", headline(report));
    for failure in &report.failures {
        println!("  ✗  {failure}");
    }
}

/// First line of the terminal output.
fn headline(report: &SyncReport) -> String {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let mark = match report.status() {
        RunStatus::Ok => "✓",
        RunStatus::Failed => "✗",
    };

    if report.fetched == 0 {
        return format!("{prefix}{mark} no campaigns returned by the source");
    }
    if report.created + report.updated + report.failed() == 0 {
        return format!(
            "{prefix}{mark} nothing to sync — {} campaigns fetched, all skipped",
            report.fetched
        );
    }
    format!(
        "{prefix}{mark} campaigns synced ({} fetched, {} new, {} updated, {} skipped, {} failed)",
        report.fetched,
        report.created,
        report.updated,
        report.skipped,
        report.failed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_not_reported_as_synced() {
        let line = headline(&SyncReport::default());
        assert_eq!(line, "✓ no campaigns returned by the source");
    }

    #[test]
    fn all_skipped_run_does_not_claim_campaigns_were_sent() {
        let report = SyncReport {
            fetched: 4,
            skipped: 4,
            ..SyncReport::default()
        };
        let line = headline(&report);
        assert!(line.contains("4 campaigns fetched, all skipped"), "got: {line}");
        assert!(!line.contains("sent"), "got: {line}");
    }

    #[test]
    fn dry_run_counts_carry_prefix() {
        let report = SyncReport {
            fetched: 3,
            created: 1,
            updated: 1,
            skipped: 1,
            dry_run: true,
            ..SyncReport::default()
        };
        assert_eq!(
            headline(&report),
            "[dry-run] ✓ campaigns synced (3 fetched, 1 new, 1 updated, 1 skipped, 0 failed)"
        );
    }
}

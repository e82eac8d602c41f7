//! Sync orchestration.
//!
//! ## `run` — one linear pass
//!
//! 1. Fetch every campaign from the source (fatal on error).
//! 2. Fetch the known-identifier index from the store (fatal on error).
//! 3. Classify: New / Updatable / Skip.
//! 4. Create each New record, update each Updatable one. A failed write is
//!    recorded and the loop moves on.
//! 5. Log the `STATUS:` summary line. A fatal error in step 1 or 2 logs the
//!    same line as `FAILED`, with whatever was fetched before it.
//!
//! Runs are assumed not to overlap; nothing here guards against two
//! concurrent invocations writing the same rows.

use std::thread;
use std::time::Duration;

use campaign_core::{Campaign, SyncRecord};

use crate::error::{RecordWriteFailed, SyncError, WriteKind};
use crate::plan::SyncPlan;
use crate::report::SyncReport;
use crate::source::CampaignSource;
use crate::store::{KnownKeys, RecordStore, RowId};

/// Per-run switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Classify and log, but issue no writes.
    pub dry_run: bool,
    /// Pause between consecutive writes.
    pub write_delay: Duration,
}

/// Pulls campaigns from a [`CampaignSource`] and upserts them into a [`RecordStore`].
pub struct Orchestrator<S, R> {
    source: S,
    store: R,
    url_base: String,
    options: SyncOptions,
}

impl<S: CampaignSource, R: RecordStore> Orchestrator<S, R> {
    /// `url_base` is the prefix of the campaign link written to every record.
    pub fn new(source: S, store: R, url_base: impl Into<String>, options: SyncOptions) -> Self {
        Self {
            source,
            store,
            url_base: url_base.into(),
            options,
        }
    }

    /// Execute one sync pass.
    ///
    /// Returns `Err` only for run-fatal errors, in which case no write was
    /// attempted. Individual write failures are reported in
    /// [`SyncReport::failures`].
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        tracing::info!(dry_run = self.options.dry_run, "starting campaign sync");

        let campaigns = match self.source.list_campaigns() {
            Ok(campaigns) => campaigns,
            Err(err) => return Err(abort(SyncError::SourceUnavailable(err), 0)),
        };
        tracing::info!(count = campaigns.len(), "fetched campaigns");

        let known = match self.store.known_keys() {
            Ok(known) => known,
            Err(err) => {
                return Err(abort(SyncError::StoreUnavailable(err), campaigns.len()));
            }
        };
        tracing::info!(count = known.len(), "fetched known identifiers");

        let report = self.write_pass(&campaigns, &known);
        report.log_summary();
        Ok(report)
    }

    fn write_pass(&self, campaigns: &[Campaign], known: &KnownKeys) -> SyncReport {
        let plan = SyncPlan::build(campaigns, known);
        for id in &plan.duplicates {
            tracing::warn!(id = %id, "campaign listed more than once; keeping first occurrence");
        }
        tracing::info!(
            new = plan.creates.len(),
            updatable = plan.updates.len(),
            skipped = plan.skipped,
            writes = plan.write_count(),
            "classified campaigns"
        );

        let mut report = SyncReport {
            fetched: campaigns.len(),
            skipped: plan.skipped,
            dry_run: self.options.dry_run,
            ..SyncReport::default()
        };

        let mut writes = 0usize;
        for campaign in &plan.creates {
            self.pace(writes);
            writes += 1;
            match self.create(campaign) {
                Ok(()) => report.created += 1,
                Err(failure) => report.failures.push(failure),
            }
        }
        for (campaign, row) in &plan.updates {
            self.pace(writes);
            writes += 1;
            match self.update(campaign, row) {
                Ok(()) => report.updated += 1,
                Err(failure) => report.failures.push(failure),
            }
        }

        report
    }

    fn create(&self, campaign: &Campaign) -> Result<(), RecordWriteFailed> {
        let record = SyncRecord::from_campaign(campaign, &self.url_base);
        if self.options.dry_run {
            tracing::info!(id = %campaign.id, name = %campaign.name, "[dry-run] would create record");
            return Ok(());
        }
        match self.store.create(&record) {
            Ok(()) => {
                tracing::info!(id = %campaign.id, name = %campaign.name, "created record");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(id = %campaign.id, error = %source, "create failed");
                Err(RecordWriteFailed {
                    id: campaign.id.clone(),
                    kind: WriteKind::Create,
                    source,
                })
            }
        }
    }

    fn update(&self, campaign: &Campaign, row: &RowId) -> Result<(), RecordWriteFailed> {
        let record = SyncRecord::from_campaign(campaign, &self.url_base);
        if self.options.dry_run {
            tracing::info!(id = %campaign.id, row = %row, "[dry-run] would update record");
            return Ok(());
        }
        match self.store.update(row, &record) {
            Ok(()) => {
                tracing::info!(id = %campaign.id, row = %row, status = %campaign.status, "updated record");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(id = %campaign.id, row = %row, error = %source, "update failed");
                Err(RecordWriteFailed {
                    id: campaign.id.clone(),
                    kind: WriteKind::Update,
                    source,
                })
            }
        }
    }

    /// Sleep before every write except the first.
    fn pace(&self, writes_so_far: usize) {
        if writes_so_far > 0 && !self.options.dry_run && !self.options.write_delay.is_zero() {
            thread::sleep(self.options.write_delay);
        }
    }
}

/// Log a fatal error and the failed summary line, then hand the error back.
fn abort(err: SyncError, fetched: usize) -> SyncError {
    tracing::error!(error = %err, "campaign sync aborted");
    SyncReport::aborted(fetched).log_summary();
    err
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

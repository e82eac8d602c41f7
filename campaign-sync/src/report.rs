//! Per-run outcome and the terminal summary line.

use std::fmt;

use crate::error::RecordWriteFailed;

/// Overall status token of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ok => write!(f, "OK"),
            RunStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Counts of a run.
///
/// `created` and `updated` count successful writes only, so a completed run
/// has `fetched == created + updated + skipped + failed`. An aborted run
/// carries only what was fetched before the fatal error.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failures: Vec<RecordWriteFailed>,
    /// Writes were only planned, not issued.
    pub dry_run: bool,
    /// A fatal error stopped the run before any write.
    pub aborted: bool,
}

impl SyncReport {
    /// Report of a run stopped by a fatal error after fetching `fetched` campaigns.
    pub fn aborted(fetched: usize) -> Self {
        Self {
            fetched,
            aborted: true,
            ..Self::default()
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// `OK` iff the run completed and no write failed.
    pub fn status(&self) -> RunStatus {
        if !self.aborted && self.failures.is_empty() {
            RunStatus::Ok
        } else {
            RunStatus::Failed
        }
    }

    /// `STATUS: OK fetched=3 new=1 updated=1 skipped=1 failed=0`
    pub fn summary_line(&self) -> String {
        format!(
            "STATUS: {} fetched={} new={} updated={} skipped={} failed={}",
            self.status(),
            self.fetched,
            self.created,
            self.updated,
            self.skipped,
            self.failed(),
        )
    }

    /// Emit the terminal summary through `tracing`.
    pub(crate) fn log_summary(&self) {
        match self.status() {
            RunStatus::Ok => tracing::info!(
                fetched = self.fetched,
                new = self.created,
                updated = self.updated,
                skipped = self.skipped,
                failed = 0,
                dry_run = self.dry_run,
                "{}",
                self.summary_line()
            ),
            RunStatus::Failed => tracing::error!(
                fetched = self.fetched,
                new = self.created,
                updated = self.updated,
                skipped = self.skipped,
                failed = self.failed(),
                dry_run = self.dry_run,
                aborted = self.aborted,
                "{}",
                self.summary_line()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, WriteKind};
    use campaign_core::CampaignId;

    #[test]
    fn clean_run_reports_ok() {
        let report = SyncReport {
            fetched: 3,
            created: 1,
            updated: 1,
            skipped: 1,
            ..SyncReport::default()
        };
        assert_eq!(report.status(), RunStatus::Ok);
        assert_eq!(
            report.summary_line(),
            "STATUS: OK fetched=3 new=1 updated=1 skipped=1 failed=0"
        );
    }

    #[test]
    fn any_failure_reports_failed() {
        let report = SyncReport {
            fetched: 2,
            created: 1,
            failures: vec![RecordWriteFailed {
                id: CampaignId::from("9"),
                kind: WriteKind::Create,
                source: ApiError::Transport("connection reset".to_string()),
            }],
            ..SyncReport::default()
        };
        assert_eq!(report.status(), RunStatus::Failed);
        assert!(report.summary_line().starts_with("STATUS: FAILED"));
        assert!(report.summary_line().ends_with("failed=1"));
    }

    #[test]
    fn aborted_run_keeps_the_summary_shape() {
        let report = SyncReport::aborted(3);
        assert_eq!(report.status(), RunStatus::Failed);
        assert_eq!(
            report.summary_line(),
            "STATUS: FAILED fetched=3 new=0 updated=0 skipped=0 failed=0"
        );
        assert_eq!(
            SyncReport::aborted(0).summary_line(),
            "STATUS: FAILED fetched=0 new=0 updated=0 skipped=0 failed=0"
        );
    }
}

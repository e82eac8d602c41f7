//! New / Updatable / Skip classification.
//!
//! | known? | terminal? | outcome    |
//! |--------|-----------|------------|
//! | no     | any       | New        |
//! | yes    | no        | Updatable  |
//! | yes    | yes       | Skip       |

use std::collections::HashSet;

use campaign_core::{Campaign, CampaignId};

use crate::store::{KnownKeys, RowId};

/// Outcome of classifying one campaign against the known-identifier set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not in the destination yet: insert.
    New,
    /// Present and still changing: update.
    Updatable,
    /// Present and terminal: leave alone.
    Skip,
}

/// Classify a single campaign.
pub fn classify(campaign: &Campaign, known: &KnownKeys) -> Classification {
    if !known.contains(&campaign.id) {
        Classification::New
    } else if campaign.status.is_terminal() {
        Classification::Skip
    } else {
        Classification::Updatable
    }
}

/// Writes to perform for one run, in source order.
#[derive(Debug, Default)]
pub struct SyncPlan<'a> {
    pub creates: Vec<&'a Campaign>,
    pub updates: Vec<(&'a Campaign, &'a RowId)>,
    pub skipped: usize,
    /// Campaigns whose identifier already appeared earlier in the same fetch.
    pub duplicates: Vec<&'a CampaignId>,
}

impl<'a> SyncPlan<'a> {
    /// Classify every campaign. A repeated identifier is planned once (first
    /// occurrence); later copies are counted as skipped.
    pub fn build(campaigns: &'a [Campaign], known: &'a KnownKeys) -> Self {
        let mut plan = SyncPlan::default();
        let mut seen = HashSet::new();

        for campaign in campaigns {
            if !seen.insert(&campaign.id) {
                plan.duplicates.push(&campaign.id);
                plan.skipped += 1;
                continue;
            }
            match classify(campaign, known) {
                Classification::New => plan.creates.push(campaign),
                Classification::Updatable => {
                    if let Some(row) = known.row_id(&campaign.id) {
                        plan.updates.push((campaign, row));
                    }
                }
                Classification::Skip => plan.skipped += 1,
            }
        }
        plan
    }

    /// Number of write calls this plan will issue.
    pub fn write_count(&self) -> usize {
        self.creates.len() + self.updates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::{CampaignStats, CampaignStatus};

    fn campaign(id: &str, status: CampaignStatus) -> Campaign {
        Campaign {
            id: CampaignId::from(id),
            name: format!("campaign {id}"),
            created_at: None,
            sent_at: None,
            status,
            stats: CampaignStats::default(),
            notes: String::new(),
        }
    }

    fn known(ids: &[&str]) -> KnownKeys {
        ids.iter()
            .enumerate()
            .map(|(i, id)| (CampaignId::from(*id), RowId::from(i as i64 + 1)))
            .collect()
    }

    #[test]
    fn unknown_campaign_is_new_even_when_sent() {
        let keys = known(&[]);
        assert_eq!(
            classify(&campaign("1", CampaignStatus::Sent), &keys),
            Classification::New
        );
    }

    #[test]
    fn known_non_terminal_is_updatable() {
        let keys = known(&["1"]);
        assert_eq!(
            classify(&campaign("1", CampaignStatus::Sending), &keys),
            Classification::Updatable
        );
        assert_eq!(
            classify(&campaign("1", CampaignStatus::Draft), &keys),
            Classification::Updatable
        );
    }

    #[test]
    fn known_sent_is_skipped() {
        let keys = known(&["1"]);
        assert_eq!(
            classify(&campaign("1", CampaignStatus::Sent), &keys),
            Classification::Skip
        );
    }

    #[test]
    fn plan_preserves_source_order_and_row_ids() {
        let campaigns = vec![
            campaign("a", CampaignStatus::Draft),
            campaign("b", CampaignStatus::Sent),
            campaign("c", CampaignStatus::Sending),
            campaign("d", CampaignStatus::Scheduled),
        ];
        let keys = known(&["b", "c"]);
        let plan = SyncPlan::build(&campaigns, &keys);

        let creates: Vec<_> = plan.creates.iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(creates, ["a", "d"]);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].0.id, CampaignId::from("c"));
        assert_eq!(plan.updates[0].1, &RowId::from(2));
        assert_eq!(plan.skipped, 1);
        assert_eq!(plan.write_count(), 3);
    }

    #[test]
    fn duplicate_identifier_in_one_fetch_is_planned_once() {
        let campaigns = vec![
            campaign("a", CampaignStatus::Draft),
            campaign("a", CampaignStatus::Draft),
        ];
        let keys = known(&[]);
        let plan = SyncPlan::build(&campaigns, &keys);
        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.skipped, 1);
        assert_eq!(plan.duplicates, [&CampaignId::from("a")]);
    }
}

//! Domain types for campaign synchronization.
//!
//! [`Campaign`] is the read-only snapshot pulled from the marketing platform;
//! [`SyncRecord`] is the row written to the destination table. Rates are
//! always derived from counts, never read from the source.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a campaign; also the natural key of its destination row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampaignId(pub String);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CampaignId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CampaignId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<u64> for CampaignId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a campaign, normalised from the source's wire token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Paused,
    Failed,
    Archived,
    Suspended,
    InReview,
    /// A token outside the known vocabulary, kept verbatim.
    Other(String),
}

impl CampaignStatus {
    /// Map a source status token (`"draft"`, `"inProcess"`, ...) to a status.
    pub fn from_token(token: &str) -> Self {
        match token {
            "draft" => Self::Draft,
            "scheduled" => Self::Scheduled,
            "queued" | "sending" | "inProcess" | "in_process" => Self::Sending,
            "sent" => Self::Sent,
            "paused" => Self::Paused,
            "failed" => Self::Failed,
            "archive" => Self::Archived,
            "suspended" => Self::Suspended,
            "inReview" => Self::InReview,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Human-facing label, also the value stored in the destination table.
    pub fn label(&self) -> &str {
        match self {
            Self::Draft => "Draft",
            Self::Scheduled => "Scheduled",
            Self::Sending => "Sending",
            Self::Sent => "Sent",
            Self::Paused => "Paused",
            Self::Failed => "Failed",
            Self::Archived => "Archived",
            Self::Suspended => "Suspended",
            Self::InReview => "InReview",
            Self::Other(token) => token,
        }
    }

    /// Metrics of a terminal campaign no longer change, so it is not re-synced.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CampaignStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// Aggregate delivery statistics of a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CampaignStats {
    /// Recipients the campaign was sent to, before bounces.
    pub sent: u64,
    pub delivered: u64,
    pub soft_bounces: u64,
    pub hard_bounces: u64,
    pub unique_opens: u64,
    pub unique_clicks: u64,
    pub unsubscriptions: u64,
    pub complaints: u64,
}

impl CampaignStats {
    /// Soft and hard bounces combined.
    pub fn bounces(&self) -> u64 {
        self.soft_bounces + self.hard_bounces
    }
}

/// Snapshot of one email campaign as reported by the marketing platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: CampaignStatus,
    pub stats: CampaignStats,
    /// Free-text notes; the source's subject line.
    pub notes: String,
}

impl Campaign {
    pub fn open_rate(&self) -> f64 {
        percentage(self.stats.unique_opens, self.stats.delivered)
    }

    pub fn click_rate(&self) -> f64 {
        percentage(self.stats.unique_clicks, self.stats.delivered)
    }

    /// Link to the campaign in the platform UI, e.g. `<base>/42`.
    pub fn url(&self, url_base: &str) -> String {
        format!("{}/{}", url_base.trim_end_matches('/'), self.id)
    }
}

/// `part / delivered` as a percentage rounded to two decimals.
///
/// Returns `0.0` when nothing was delivered.
pub fn percentage(part: u64, delivered: u64) -> f64 {
    if delivered == 0 {
        return 0.0;
    }
    let pct = part as f64 / delivered as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Sync record
// ---------------------------------------------------------------------------

/// Destination row mirroring one campaign.
///
/// Serialized field names are the destination table's column names. Columns
/// maintained by hand in the table (budget, conversions, ROI) are absent so
/// that updates never overwrite them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    #[serde(rename = "id_campagna")]
    pub id: CampaignId,
    #[serde(rename = "nome_campagna")]
    pub name: String,
    #[serde(rename = "data_creazione")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "data_invio")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(rename = "stato")]
    pub status: String,
    #[serde(rename = "num_contatti")]
    pub delivered: u64,
    #[serde(rename = "num_bounce")]
    pub bounces: u64,
    #[serde(rename = "aperture_uniche")]
    pub unique_opens: u64,
    #[serde(rename = "clic_unici")]
    pub unique_clicks: u64,
    #[serde(rename = "tasso_apertura_pct")]
    pub open_rate: f64,
    #[serde(rename = "tasso_clic_pct")]
    pub click_rate: f64,
    #[serde(rename = "note")]
    pub notes: String,
    #[serde(rename = "url_campagna")]
    pub url: String,
}

impl SyncRecord {
    /// Build the full field set for `campaign`, recomputing both rates.
    pub fn from_campaign(campaign: &Campaign, url_base: &str) -> Self {
        Self {
            id: campaign.id.clone(),
            name: campaign.name.clone(),
            created_at: campaign.created_at,
            sent_at: campaign.sent_at,
            status: campaign.status.label().to_owned(),
            delivered: campaign.stats.delivered,
            bounces: campaign.stats.bounces(),
            unique_opens: campaign.stats.unique_opens,
            unique_clicks: campaign.stats.unique_clicks,
            open_rate: campaign.open_rate(),
            click_rate: campaign.click_rate(),
            notes: campaign.notes.clone(),
            url: campaign.url(url_base),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn campaign(delivered: u64, opens: u64, clicks: u64) -> Campaign {
        Campaign {
            id: CampaignId::from(42u64),
            name: "Spring newsletter".to_string(),
            created_at: None,
            sent_at: None,
            status: CampaignStatus::Sent,
            stats: CampaignStats {
                delivered,
                hard_bounces: 3,
                unique_opens: opens,
                unique_clicks: clicks,
                ..CampaignStats::default()
            },
            notes: "Spring is here".to_string(),
        }
    }

    #[test]
    fn zero_delivered_yields_zero_rates() {
        let c = campaign(0, 10, 5);
        assert_eq!(c.open_rate(), 0.0);
        assert_eq!(c.click_rate(), 0.0);
    }

    #[test]
    fn open_rate_is_percentage_of_delivered() {
        let c = campaign(200, 50, 7);
        assert_eq!(c.open_rate(), 25.0);
        assert_eq!(c.click_rate(), 3.5);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
    }

    #[rstest]
    #[case("draft", CampaignStatus::Draft)]
    #[case("scheduled", CampaignStatus::Scheduled)]
    #[case("queued", CampaignStatus::Sending)]
    #[case("inProcess", CampaignStatus::Sending)]
    #[case("sent", CampaignStatus::Sent)]
    #[case("archive", CampaignStatus::Archived)]
    #[case("inReview", CampaignStatus::InReview)]
    fn status_tokens_map_to_labels(#[case] token: &str, #[case] expected: CampaignStatus) {
        assert_eq!(CampaignStatus::from_token(token), expected);
    }

    #[test]
    fn unknown_status_token_is_kept_verbatim() {
        let status = CampaignStatus::from_token("somethingNew");
        assert_eq!(status.to_string(), "somethingNew");
        assert!(!status.is_terminal());
    }

    #[test]
    fn only_sent_is_terminal() {
        assert!(CampaignStatus::Sent.is_terminal());
        assert!(!CampaignStatus::Sending.is_terminal());
        assert!(!CampaignStatus::Archived.is_terminal());
    }

    #[test]
    fn sync_record_uses_table_column_names() {
        let record =
            SyncRecord::from_campaign(&campaign(200, 50, 10), "https://app.brevo.com/campaigns/");
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["id_campagna"], "42");
        assert_eq!(json["stato"], "Sent");
        assert_eq!(json["tasso_apertura_pct"], 25.0);
        assert_eq!(json["tasso_clic_pct"], 5.0);
        assert_eq!(json["url_campagna"], "https://app.brevo.com/campaigns/42");
        assert_eq!(json["num_bounce"], 3);
        assert!(json.get("budget").is_none());
    }
}

//! Brevo email-campaign client.
//!
//! `GET {api_url}/emailCampaigns?statistics=globalStats&limit=N&offset=M`,
//! authenticated with the `api-key` header. Pages are requested until the
//! reported `count` is reached or a page comes back empty.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use campaign_core::{
    config::{SourceConfig, SyncSettings},
    Campaign, CampaignId, CampaignStats, CampaignStatus,
};

use crate::error::{from_ureq, read_body, ApiError};
use crate::source::CampaignSource;

#[derive(Debug, Deserialize)]
struct CampaignPage {
    #[serde(default)]
    campaigns: Vec<WireCampaign>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCampaign {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    scheduled_at: Option<String>,
    #[serde(default)]
    sent_date: Option<String>,
    /// `{ "globalStats": { ... } }`; shape varies with campaign state.
    #[serde(default)]
    statistics: Option<Value>,
}

impl WireCampaign {
    fn into_campaign(self) -> Campaign {
        let global = self
            .statistics
            .as_ref()
            .and_then(|s| s.get("globalStats"))
            .cloned()
            .unwrap_or(Value::Null);
        let count = |key: &str| global.get(key).and_then(Value::as_u64).unwrap_or(0);

        Campaign {
            id: CampaignId::from(self.id),
            name: self.name.unwrap_or_else(|| "N/A".to_string()),
            created_at: parse_timestamp(self.created_at.as_deref()),
            sent_at: parse_timestamp(self.sent_date.as_deref())
                .or_else(|| parse_timestamp(self.scheduled_at.as_deref())),
            status: CampaignStatus::from_token(self.status.as_deref().unwrap_or("unknown")),
            stats: CampaignStats {
                sent: count("sent"),
                delivered: count("delivered"),
                soft_bounces: count("softBounces"),
                hard_bounces: count("hardBounces"),
                unique_opens: count("uniqueViews"),
                unique_clicks: count("uniqueClicks"),
                unsubscriptions: count("unsubscriptions"),
                complaints: count("complaints"),
            },
            notes: self.subject.unwrap_or_default(),
        }
    }
}

/// RFC 3339 → UTC; anything unparseable becomes `None`.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(err) => {
            tracing::debug!(value = raw, error = %err, "ignoring unparseable timestamp");
            None
        }
    }
}

fn parse_page(body: &str) -> Result<(Vec<Campaign>, Option<u64>), ApiError> {
    let page: CampaignPage = serde_json::from_str(body)?;
    let campaigns = page
        .campaigns
        .into_iter()
        .map(WireCampaign::into_campaign)
        .collect();
    Ok((campaigns, page.count))
}

/// Whether paging stops after a page of `page_len` campaigns.
///
/// `fetched` includes that page. With a reported `total` the count decides;
/// without one a short page marks the end. An empty page always ends it.
fn page_done(fetched: usize, page_len: usize, total: Option<u64>, page_size: u32) -> bool {
    if page_len == 0 {
        return true;
    }
    match total {
        Some(total) => fetched as u64 >= total,
        None => page_len < page_size as usize,
    }
}

fn parse_campaign(body: &str) -> Result<Campaign, ApiError> {
    let wire: WireCampaign = serde_json::from_str(body)?;
    Ok(wire.into_campaign())
}

/// Blocking client for the Brevo campaigns API.
#[derive(Clone)]
pub struct BrevoClient {
    agent: ureq::Agent,
    api_url: String,
    api_key: String,
    page_size: u32,
}

impl fmt::Debug for BrevoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrevoClient")
            .field("api_url", &self.api_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl BrevoClient {
    pub fn new(config: &SourceConfig, settings: &SyncSettings) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(settings.timeout).build();
        Self {
            agent,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            page_size: settings.page_size,
        }
    }

    fn get(&self, path: &str) -> ureq::Request {
        self.agent
            .get(&format!("{}{}", self.api_url, path))
            .set("api-key", &self.api_key)
            .set("Accept", "application/json")
    }

    fn fetch_page(&self, offset: u64) -> Result<(Vec<Campaign>, Option<u64>), ApiError> {
        let response = from_ureq(
            self.get("/emailCampaigns")
                .query("statistics", "globalStats")
                .query("limit", &self.page_size.to_string())
                .query("offset", &offset.to_string())
                .call(),
        )?;
        parse_page(&read_body(response)?)
    }

    /// Fetch one campaign with its statistics.
    pub fn campaign(&self, id: &CampaignId) -> Result<Campaign, ApiError> {
        let response = from_ureq(
            self.get(&format!("/emailCampaigns/{id}"))
                .query("statistics", "globalStats")
                .call(),
        )?;
        parse_campaign(&read_body(response)?)
    }
}

impl CampaignSource for BrevoClient {
    fn list_campaigns(&self) -> Result<Vec<Campaign>, ApiError> {
        let mut campaigns = Vec::new();
        loop {
            let offset = campaigns.len() as u64;
            let (page, total) = self.fetch_page(offset)?;
            let page_len = page.len();
            tracing::debug!(offset, page_len, total, "fetched campaign page");
            campaigns.extend(page);

            if page_done(campaigns.len(), page_len, total, self.page_size) {
                break;
            }
        }
        Ok(campaigns)
    }
}

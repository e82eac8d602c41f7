//! NocoDB table client (REST v2).
//!
//! All calls go to `{api_url}/tables/{table_id}/records` with
//! `Authorization: Bearer <token>`:
//!
//! | call   | method | body / query |
//! |--------|--------|--------------|
//! | index  | GET    | `fields=Id,id_campagna&limit&offset`, paged on `pageInfo.isLastPage` |
//! | create | POST   | record object |
//! | update | PATCH  | record object plus `Id` |

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use campaign_core::{
    config::{StoreConfig, SyncSettings},
    CampaignId, SyncRecord,
};

use crate::error::{from_ureq, read_body, ApiError};
use crate::store::{KnownKeys, RecordStore, RowId};

/// Primary-key column NocoDB adds to every table.
const PRIMARY_KEY: &str = "Id";
/// Column holding the campaign identifier.
const KEY_COLUMN: &str = "id_campagna";

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    list: Vec<Value>,
    #[serde(default, rename = "pageInfo")]
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default, rename = "isLastPage")]
    is_last_page: Option<bool>,
}

/// One page of `(campaign id, row id)` pairs, plus whether it was the last.
#[derive(Debug)]
struct KeyPage {
    rows: Vec<(CampaignId, RowId)>,
    listed: usize,
    last: Option<bool>,
}

fn parse_key_page(body: &str) -> Result<KeyPage, ApiError> {
    let page: RecordPage = serde_json::from_str(body)?;
    let listed = page.list.len();
    let mut rows = Vec::with_capacity(listed);

    for row in page.list {
        let id = match row.get(KEY_COLUMN) {
            Some(Value::String(s)) if !s.trim().is_empty() => CampaignId::from(s.trim()),
            Some(Value::Number(n)) => CampaignId::from(n.to_string()),
            _ => {
                tracing::debug!(row = %row, "row without campaign id; ignored");
                continue;
            }
        };
        let row_id = match row.get(PRIMARY_KEY) {
            Some(v) if v.is_number() || v.is_string() => RowId(v.clone()),
            _ => {
                return Err(ApiError::Decode(format!(
                    "row for campaign {id} has no usable `{PRIMARY_KEY}` column"
                )))
            }
        };
        rows.push((id, row_id));
    }

    Ok(KeyPage {
        rows,
        listed,
        last: page.page_info.and_then(|p| p.is_last_page),
    })
}

/// Whether paging stops after a page listing `listed` rows.
///
/// `pageInfo.isLastPage` decides when present; otherwise a short page marks
/// the end. An empty page always ends it.
fn key_page_done(listed: usize, last: Option<bool>, page_size: u32) -> bool {
    listed == 0 || last.unwrap_or(listed < page_size as usize)
}

/// Body for an update: the record's columns plus the primary key.
fn update_body(row: &RowId, record: &SyncRecord) -> Result<Value, ApiError> {
    let Value::Object(mut map) = serde_json::to_value(record)? else {
        return Err(ApiError::Decode(
            "record did not serialize to an object".to_string(),
        ));
    };
    map.insert(PRIMARY_KEY.to_string(), row.0.clone());
    Ok(Value::Object(map))
}

/// Blocking client for one NocoDB table.
#[derive(Clone)]
pub struct NocoDbClient {
    agent: ureq::Agent,
    records_url: String,
    api_key: String,
    page_size: u32,
}

impl fmt::Debug for NocoDbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NocoDbClient")
            .field("records_url", &self.records_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl NocoDbClient {
    pub fn new(config: &StoreConfig, settings: &SyncSettings) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(settings.timeout).build();
        Self {
            agent,
            records_url: config.records_url(),
            api_key: config.api_key.clone(),
            page_size: settings.page_size,
        }
    }

    fn request(&self, method: &str) -> ureq::Request {
        self.agent
            .request(method, &self.records_url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Accept", "application/json")
    }

    /// Check that the table is reachable with the configured token.
    pub fn verify(&self) -> Result<(), ApiError> {
        from_ureq(self.request("GET").query("limit", "1").call())?;
        Ok(())
    }

    /// Location of the table, for messages.
    pub fn records_url(&self) -> &str {
        &self.records_url
    }
}

impl RecordStore for NocoDbClient {
    fn known_keys(&self) -> Result<KnownKeys, ApiError> {
        let mut keys = KnownKeys::new();
        let mut offset = 0usize;
        loop {
            let response = from_ureq(
                self.request("GET")
                    .query("fields", &format!("{PRIMARY_KEY},{KEY_COLUMN}"))
                    .query("limit", &self.page_size.to_string())
                    .query("offset", &offset.to_string())
                    .call(),
            )?;
            let page = parse_key_page(&read_body(response)?)?;
            tracing::debug!(offset, rows = page.listed, "fetched record page");

            for (id, row) in page.rows {
                if !keys.insert(id.clone(), row) {
                    tracing::warn!(id = %id, "campaign present in more than one row; using the first");
                }
            }
            offset += page.listed;

            if key_page_done(page.listed, page.last, self.page_size) {
                break;
            }
        }
        Ok(keys)
    }

    fn create(&self, record: &SyncRecord) -> Result<(), ApiError> {
        from_ureq(
            self.request("POST")
                .set("Content-Type", "application/json")
                .send_json(record),
        )?;
        Ok(())
    }

    fn update(&self, row: &RowId, record: &SyncRecord) -> Result<(), ApiError> {
        let body = update_body(row, record)?;
        from_ureq(
            self.request("PATCH")
                .set("Content-Type", "application/json")
                .send_json(body),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::{Campaign, CampaignStats, CampaignStatus};
    use rstest::rstest;

    #[test]
    fn key_page_maps_campaign_ids_to_row_ids() {
        let page = parse_key_page(
            r#"{
                "list": [
                    {"Id": 1, "id_campagna": "12"},
                    {"Id": 2, "id_campagna": 13},
                    {"Id": 3, "id_campagna": null},
                    {"Id": 4}
                ],
                "pageInfo": {"totalRows": 4, "page": 1, "pageSize": 25, "isFirstPage": true, "isLastPage": true}
            }"#,
        )
        .expect("parse");

        assert_eq!(page.listed, 4);
        assert_eq!(page.last, Some(true));
        assert_eq!(
            page.rows,
            vec![
                (CampaignId::from("12"), RowId::from(1)),
                (CampaignId::from("13"), RowId::from(2)),
            ]
        );
    }

    #[test]
    fn row_without_primary_key_is_rejected() {
        let err = parse_key_page(r#"{"list": [{"id_campagna": "12"}]}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(err.to_string().contains("campaign 12"));
    }

    #[test]
    fn page_without_page_info_leaves_last_unknown() {
        let page = parse_key_page(r#"{"list": []}"#).expect("parse");
        assert_eq!(page.listed, 0);
        assert_eq!(page.last, None);
    }

    #[test]
    fn update_body_carries_primary_key_and_columns() {
        let campaign = Campaign {
            id: CampaignId::from("12"),
            name: "October promo".to_string(),
            created_at: None,
            sent_at: None,
            status: CampaignStatus::Sending,
            stats: CampaignStats {
                delivered: 100,
                soft_bounces: 1,
                unique_opens: 40,
                unique_clicks: 4,
                ..CampaignStats::default()
            },
            notes: String::new(),
        };
        let record = SyncRecord::from_campaign(&campaign, "https://app.brevo.com/campaigns");
        let body = update_body(&RowId::from(7), &record).expect("body");

        assert_eq!(body["Id"], 7);
        assert_eq!(body["id_campagna"], "12");
        assert_eq!(body["stato"], "Sending");
        assert_eq!(body["tasso_apertura_pct"], 40.0);
        assert_eq!(body["num_bounce"], 1);
    }

    #[rstest]
    #[case::last_page_flagged(25, Some(true), 100, true)]
    #[case::more_pages_flagged(100, Some(false), 100, false)]
    #[case::flag_wins_over_short_page(40, Some(false), 100, false)]
    #[case::empty_page(0, Some(false), 100, true)]
    #[case::no_page_info_full_page(100, None, 100, false)]
    #[case::no_page_info_short_page(7, None, 100, true)]
    fn index_paging_follows_last_page_flag(
        #[case] listed: usize,
        #[case] last: Option<bool>,
        #[case] page_size: u32,
        #[case] expected: bool,
    ) {
        assert_eq!(key_page_done(listed, last, page_size), expected);
    }
}

//! `campaign-sync campaigns` — read-only view of campaign statistics.
//!
//! Prints a table by default, JSON with `--json`, or writes one CSV row per
//! campaign with `--csv <PATH>` for import into a spreadsheet or table.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use campaign_core::{Campaign, CampaignId, CampaignStatus};
use campaign_sync::{BrevoClient, CampaignSource};

use crate::logging;

/// Arguments for `campaign-sync campaigns`.
#[derive(Args, Debug)]
pub struct CampaignsArgs {
    /// Show a single campaign instead of the full list.
    pub id: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long, conflicts_with = "csv")]
    pub json: bool,

    /// Write every campaign with its full statistics to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

impl CampaignsArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = super::load_config(config_path)?;
        logging::init(None)?;

        let client = BrevoClient::new(&config.source, &config.sync);
        let campaigns = match self.id.as_deref() {
            Some(id) => {
                let id = CampaignId::from(id);
                vec![client
                    .campaign(&id)
                    .with_context(|| format!("failed to fetch campaign {id}"))?]
            }
            None => client
                .list_campaigns()
                .context("failed to list campaigns")?,
        };

        let url_base = &config.source.campaign_url_base;
        if let Some(path) = self.csv.as_deref() {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            write_csv(&campaigns, url_base, file)
                .with_context(|| format!("failed to write CSV to {}", path.display()))?;
            println!("✓ {} campaigns written to {}", campaigns.len(), path.display());
        } else if self.json {
            print_json(&campaigns, url_base)?;
        } else {
            print_table(&campaigns, url_base);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CampaignJson<'a> {
    #[serde(flatten)]
    campaign: &'a Campaign,
    open_rate: f64,
    click_rate: f64,
    url: String,
}

/// One CSV line; field names are the export's column headers.
#[derive(Serialize)]
struct CampaignCsvRow<'a> {
    id_campagna: &'a str,
    nome_campagna: &'a str,
    data_creazione: Option<String>,
    data_invio: Option<String>,
    stato: &'a str,
    sent: u64,
    delivered: u64,
    unique_views: u64,
    unique_clicks: u64,
    tasso_apertura_pct: f64,
    tasso_clic_pct: f64,
    soft_bounces: u64,
    hard_bounces: u64,
    unsubscriptions: u64,
    complaints: u64,
    note: &'a str,
    url_campagna: String,
}

impl<'a> CampaignCsvRow<'a> {
    fn new(campaign: &'a Campaign, url_base: &str) -> Self {
        let stats = &campaign.stats;
        Self {
            id_campagna: &campaign.id.0,
            nome_campagna: &campaign.name,
            data_creazione: campaign.created_at.map(|ts| ts.to_rfc3339()),
            data_invio: campaign.sent_at.map(|ts| ts.to_rfc3339()),
            stato: campaign.status.label(),
            sent: stats.sent,
            delivered: stats.delivered,
            unique_views: stats.unique_opens,
            unique_clicks: stats.unique_clicks,
            tasso_apertura_pct: campaign.open_rate(),
            tasso_clic_pct: campaign.click_rate(),
            soft_bounces: stats.soft_bounces,
            hard_bounces: stats.hard_bounces,
            unsubscriptions: stats.unsubscriptions,
            complaints: stats.complaints,
            note: &campaign.notes,
            url_campagna: campaign.url(url_base),
        }
    }
}

/// Header plus one row per campaign, in source order.
fn write_csv<W: io::Write>(campaigns: &[Campaign], url_base: &str, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for campaign in campaigns {
        writer.serialize(CampaignCsvRow::new(campaign, url_base))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Tabled)]
struct CampaignTableRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "sent")]
    sent: String,
    #[tabled(rename = "delivered")]
    delivered: u64,
    #[tabled(rename = "open %")]
    open_rate: String,
    #[tabled(rename = "click %")]
    click_rate: String,
}

fn print_json(campaigns: &[Campaign], url_base: &str) -> Result<()> {
    let payload: Vec<CampaignJson<'_>> = campaigns
        .iter()
        .map(|campaign| CampaignJson {
            campaign,
            open_rate: campaign.open_rate(),
            click_rate: campaign.click_rate(),
            url: campaign.url(url_base),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize campaigns JSON")?
    );
    Ok(())
}

fn print_table(campaigns: &[Campaign], url_base: &str) {
    let sent = campaigns
        .iter()
        .filter(|c| c.status == CampaignStatus::Sent)
        .count();
    println!(
        "{} | {} campaigns | {} sent",
        "Brevo".bold(),
        campaigns.len(),
        sent
    );

    if campaigns.is_empty() {
        println!("No campaigns found.");
        return;
    }

    let rows: Vec<CampaignTableRow> = campaigns
        .iter()
        .map(|c| CampaignTableRow {
            id: c.id.to_string(),
            name: c.name.clone(),
            status: status_label(&c.status),
            sent: c
                .sent_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            delivered: c.stats.delivered,
            open_rate: format!("{:.2}", c.open_rate()),
            click_rate: format!("{:.2}", c.click_rate()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if campaigns.len() == 1 {
        println!("{}", campaigns[0].url(url_base).bright_black());
    }
}

fn status_label(status: &CampaignStatus) -> String {
    let label = status.label();
    match status {
        CampaignStatus::Sent => label.green().to_string(),
        CampaignStatus::Sending | CampaignStatus::Scheduled => label.yellow().to_string(),
        CampaignStatus::Failed | CampaignStatus::Suspended => label.red().to_string(),
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::CampaignStats;
    use chrono::{TimeZone, Utc};

    fn fixture() -> Campaign {
        Campaign {
            id: CampaignId::from(12u64),
            name: "October promo, part 2".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).single(),
            sent_at: None,
            status: CampaignStatus::Sent,
            stats: CampaignStats {
                sent: 206,
                delivered: 200,
                soft_bounces: 3,
                hard_bounces: 2,
                unique_opens: 50,
                unique_clicks: 10,
                unsubscriptions: 4,
                complaints: 1,
            },
            notes: "Save 20%".to_string(),
        }
    }

    fn export(campaigns: &[Campaign]) -> String {
        let mut out = Vec::new();
        write_csv(campaigns, "https://app.brevo.com/campaigns", &mut out).expect("write csv");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn header_lists_every_export_column() {
        let csv = export(&[fixture()]);
        let header = csv.lines().next().expect("header");
        assert_eq!(
            header,
            "id_campagna,nome_campagna,data_creazione,data_invio,stato,sent,delivered,\
             unique_views,unique_clicks,tasso_apertura_pct,tasso_clic_pct,soft_bounces,\
             hard_bounces,unsubscriptions,complaints,note,url_campagna"
        );
    }

    #[test]
    fn row_carries_counts_rates_and_link() {
        let csv = export(&[fixture()]);
        let row = csv.lines().nth(1).expect("row");
        assert_eq!(
            row,
            "12,\"October promo, part 2\",2024-10-01T08:00:00+00:00,,Sent,206,200,\
             50,10,25.0,5.0,3,2,4,1,Save 20%,https://app.brevo.com/campaigns/12"
        );
    }

    #[test]
    fn no_campaigns_writes_nothing() {
        assert_eq!(export(&[]), "");
    }
}

//! campaign-core — domain types, configuration resolution, errors.
//!
//! - [`types`] — campaigns, statuses, destination records, rate math
//! - [`config`] — environment-then-file configuration
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{Campaign, CampaignId, CampaignStats, CampaignStatus, SyncRecord};

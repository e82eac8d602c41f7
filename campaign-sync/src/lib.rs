//! # campaign-sync
//!
//! One-pass campaign synchronization: fetch campaigns from a
//! [`CampaignSource`], index the [`RecordStore`], classify, then create or
//! update rows.
//!
//! [`Orchestrator::run`] is the entry point; [`BrevoClient`] and
//! [`NocoDbClient`] are the production source and store.

pub mod brevo;
pub mod error;
pub mod nocodb;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod source;
pub mod store;

pub use brevo::BrevoClient;
pub use error::{ApiError, RecordWriteFailed, SyncError, WriteKind};
pub use nocodb::NocoDbClient;
pub use orchestrator::{Orchestrator, SyncOptions};
pub use plan::{classify, Classification, SyncPlan};
pub use report::{RunStatus, SyncReport};
pub use source::CampaignSource;
pub use store::{KnownKeys, RecordStore, RowId};

//! Read side: where campaigns come from.

use campaign_core::Campaign;

use crate::error::ApiError;

/// A read-only provider of campaign snapshots with aggregate statistics.
pub trait CampaignSource {
    /// Fetch the full current campaign list, statistics included.
    fn list_campaigns(&self) -> Result<Vec<Campaign>, ApiError>;
}

impl<T: CampaignSource + ?Sized> CampaignSource for &T {
    fn list_campaigns(&self) -> Result<Vec<Campaign>, ApiError> {
        (**self).list_campaigns()
    }
}

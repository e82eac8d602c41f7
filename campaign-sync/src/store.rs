//! Write side: the destination table and its known-identifier index.

use std::collections::HashMap;
use std::fmt;

use campaign_core::{CampaignId, SyncRecord};

use crate::error::ApiError;

/// Primary key of a destination row, as the store reported it.
///
/// Kept as a JSON value so numeric and textual keys round-trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RowId(pub serde_json::Value);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        Self(serde_json::Value::from(n))
    }
}

/// Campaign identifiers already present in the destination, with the row
/// each one lives in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownKeys {
    rows: HashMap<CampaignId, RowId>,
}

impl KnownKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as present. Returns `false` (and keeps the first row) if
    /// the identifier was already known.
    pub fn insert(&mut self, id: CampaignId, row: RowId) -> bool {
        if self.rows.contains_key(&id) {
            return false;
        }
        self.rows.insert(id, row);
        true
    }

    pub fn contains(&self, id: &CampaignId) -> bool {
        self.rows.contains_key(id)
    }

    pub fn row_id(&self, id: &CampaignId) -> Option<&RowId> {
        self.rows.get(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(CampaignId, RowId)> for KnownKeys {
    fn from_iter<I: IntoIterator<Item = (CampaignId, RowId)>>(iter: I) -> Self {
        let mut keys = KnownKeys::new();
        for (id, row) in iter {
            keys.insert(id, row);
        }
        keys
    }
}

/// A destination table supporting index, create and update.
pub trait RecordStore {
    /// Every campaign identifier currently present in the table.
    fn known_keys(&self) -> Result<KnownKeys, ApiError>;

    /// Insert a new row carrying the full field set.
    fn create(&self, record: &SyncRecord) -> Result<(), ApiError>;

    /// Overwrite the full field set of an existing row.
    fn update(&self, row: &RowId, record: &SyncRecord) -> Result<(), ApiError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn known_keys(&self) -> Result<KnownKeys, ApiError> {
        (**self).known_keys()
    }

    fn create(&self, record: &SyncRecord) -> Result<(), ApiError> {
        (**self).create(record)
    }

    fn update(&self, row: &RowId, record: &SyncRecord) -> Result<(), ApiError> {
        (**self).update(row, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_row_wins_for_duplicate_identifier() {
        let mut keys = KnownKeys::new();
        assert!(keys.insert(CampaignId::from("7"), RowId::from(1)));
        assert!(!keys.insert(CampaignId::from("7"), RowId::from(2)));
        assert_eq!(keys.len(), 1);
        assert_eq!(keys.row_id(&CampaignId::from("7")), Some(&RowId::from(1)));
    }

    #[test]
    fn row_id_display_is_unquoted() {
        assert_eq!(RowId::from(12).to_string(), "12");
        assert_eq!(RowId(serde_json::json!("rec_abc")).to_string(), "rec_abc");
    }
}

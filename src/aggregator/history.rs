//! Rating history storage
//!
//! One snapshot row per (company, date). Writes overwrite, so reprocessing a
//! date can never accumulate drift.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::VotingError;
use crate::types::{CompanyId, RatingSnapshot};

/// Trait for rating history operations
pub trait HistoryStore: Send + Sync {
    /// Insert or overwrite the snapshot for (company, date)
    fn upsert(&self, snapshot: RatingSnapshot) -> crate::error::Result<()>;

    /// Get the snapshot for a company on a date
    fn get(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> crate::error::Result<Option<RatingSnapshot>>;

    /// All snapshots for a date, ordered by company id
    fn for_date(&self, date: NaiveDate) -> crate::error::Result<Vec<RatingSnapshot>>;

    /// All snapshots for a company, ordered by date
    fn for_company(&self, company_id: CompanyId) -> crate::error::Result<Vec<RatingSnapshot>>;
}

/// In-memory rating history implementation
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    snapshots: RwLock<HashMap<(CompanyId, NaiveDate), RatingSnapshot>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn upsert(&self, snapshot: RatingSnapshot) -> crate::error::Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire history write lock".to_string(),
            })?;

        snapshots.insert((snapshot.company_id, snapshot.date), snapshot);
        Ok(())
    }

    fn get(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> crate::error::Result<Option<RatingSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire history read lock".to_string(),
            })?;

        Ok(snapshots.get(&(company_id, date)).cloned())
    }

    fn for_date(&self, date: NaiveDate) -> crate::error::Result<Vec<RatingSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire history read lock".to_string(),
            })?;

        let mut rows: Vec<RatingSnapshot> = snapshots
            .values()
            .filter(|s| s.date == date)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.company_id);
        Ok(rows)
    }

    fn for_company(&self, company_id: CompanyId) -> crate::error::Result<Vec<RatingSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire history read lock".to_string(),
            })?;

        let mut rows: Vec<RatingSnapshot> = snapshots
            .values()
            .filter(|s| s.company_id == company_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.date);
        Ok(rows)
    }
}

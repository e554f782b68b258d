//! Scheduled comparison storage
//!
//! Schedule entries are created ahead of time by an operator. One entry per
//! date; entries for dates that have already passed are historical record and
//! can no longer be replaced or removed.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::VotingError;
use crate::types::ScheduledComparison;
use crate::utils::today_utc;

/// Trait for schedule storage operations
pub trait ScheduleStore: Send + Sync {
    /// Get the schedule entry for a date, if any
    fn get(&self, date: NaiveDate) -> crate::error::Result<Option<ScheduledComparison>>;

    /// Insert a schedule entry. Fails when an entry already exists for the
    /// date, when fewer than 2 companies are linked, or when the date has
    /// already passed.
    fn insert(&self, comparison: ScheduledComparison) -> crate::error::Result<()>;

    /// Remove a schedule entry for a future date
    fn remove(&self, date: NaiveDate) -> crate::error::Result<bool>;
}

/// In-memory schedule storage implementation
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    entries: RwLock<HashMap<NaiveDate, ScheduledComparison>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn get(&self, date: NaiveDate) -> crate::error::Result<Option<ScheduledComparison>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire schedule read lock".to_string(),
            })?;

        Ok(entries.get(&date).cloned())
    }

    fn insert(&self, comparison: ScheduledComparison) -> crate::error::Result<()> {
        if comparison.company_ids.len() < 2 {
            return Err(VotingError::InvalidInput {
                reason: format!(
                    "A scheduled comparison needs at least 2 companies, got {}",
                    comparison.company_ids.len()
                ),
            }
            .into());
        }

        if comparison.date < today_utc() {
            return Err(VotingError::InvalidInput {
                reason: format!("Cannot schedule a comparison for past date {}", comparison.date),
            }
            .into());
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire schedule write lock".to_string(),
            })?;

        if entries.contains_key(&comparison.date) {
            return Err(VotingError::InvalidInput {
                reason: format!("A comparison is already scheduled for {}", comparison.date),
            }
            .into());
        }

        entries.insert(comparison.date, comparison);
        Ok(())
    }

    fn remove(&self, date: NaiveDate) -> crate::error::Result<bool> {
        if date < today_utc() {
            return Err(VotingError::InvalidInput {
                reason: format!("Cannot remove the historical comparison for {}", date),
            }
            .into());
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire schedule write lock".to_string(),
            })?;

        Ok(entries.remove(&date).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(date: NaiveDate, ids: Vec<u64>) -> ScheduledComparison {
        ScheduledComparison {
            date,
            theme: "Tech Giants".to_string(),
            company_ids: ids,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = InMemoryScheduleStore::new();
        let date = today_utc() + Duration::days(3);

        store.insert(entry(date, vec![1, 2])).unwrap();

        let fetched = store.get(date).unwrap().unwrap();
        assert_eq!(fetched.company_ids, vec![1, 2]);
        assert!(store.get(date + Duration::days(1)).unwrap().is_none());
    }

    #[test]
    fn test_one_entry_per_date() {
        let store = InMemoryScheduleStore::new();
        let date = today_utc() + Duration::days(3);

        store.insert(entry(date, vec![1, 2])).unwrap();
        assert!(store.insert(entry(date, vec![3, 4])).is_err());
    }

    #[test]
    fn test_requires_two_companies() {
        let store = InMemoryScheduleStore::new();
        let date = today_utc() + Duration::days(3);
        assert!(store.insert(entry(date, vec![1])).is_err());
    }

    #[test]
    fn test_past_dates_are_immutable() {
        let store = InMemoryScheduleStore::new();
        let yesterday = today_utc() - Duration::days(1);

        assert!(store.insert(entry(yesterday, vec![1, 2])).is_err());
        assert!(store.remove(yesterday).is_err());
    }

    #[test]
    fn test_remove_future_entry() {
        let store = InMemoryScheduleStore::new();
        let date = today_utc() + Duration::days(3);

        store.insert(entry(date, vec![1, 2])).unwrap();
        assert!(store.remove(date).unwrap());
        assert!(!store.remove(date).unwrap());
    }
}

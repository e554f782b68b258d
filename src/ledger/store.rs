//! Vote storage interface and implementations
//!
//! The ledger is append-only. Uniqueness of (identity, date) is enforced
//! inside the insert itself, under a single write lock, never as a separate
//! existence check followed by an insert: two concurrent submissions from the
//! same identity must serialize so that exactly one lands.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::VotingError;
use crate::types::{CompanyId, Identity, Vote};
use crate::utils::{current_timestamp, generate_vote_id};

/// Trait for vote ledger operations
pub trait VoteStore: Send + Sync {
    /// Append a vote for (identity, date). Fails with `DuplicateVote` when the
    /// identity already voted that day; the check and the append are one
    /// atomic operation.
    fn insert(
        &self,
        identity: Identity,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> crate::error::Result<Vote>;

    /// Whether the identity has a vote recorded for the date
    fn has_voted(&self, identity: &Identity, date: NaiveDate) -> crate::error::Result<bool>;

    /// All votes cast on a date
    fn votes_for_date(&self, date: NaiveDate) -> crate::error::Result<Vec<Vote>>;

    /// Ledger-derived win counts per company (all dates)
    fn count_by_company(&self) -> crate::error::Result<HashMap<CompanyId, u64>>;

    /// Ledger-derived win count for one company
    fn count_for_company(&self, company_id: CompanyId) -> crate::error::Result<u64>;
}

/// In-memory vote ledger implementation
#[derive(Debug, Default)]
pub struct InMemoryVoteStore {
    inner: RwLock<LedgerInner>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    votes: Vec<Vote>,
    /// Uniqueness index over (identity key, date)
    index: HashSet<(String, NaiveDate)>,
}

impl InMemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VoteStore for InMemoryVoteStore {
    fn insert(
        &self,
        identity: Identity,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> crate::error::Result<Vote> {
        let mut inner = self.inner.write().map_err(|_| VotingError::Internal {
            message: "Failed to acquire ledger write lock".to_string(),
        })?;

        let key = (identity.key(), date);
        if inner.index.contains(&key) {
            return Err(VotingError::DuplicateVote {
                identity: identity.key(),
                date,
            }
            .into());
        }

        let vote = Vote {
            id: generate_vote_id(),
            company_id,
            identity,
            comparison_date: date,
            created_at: current_timestamp(),
        };

        inner.index.insert(key);
        inner.votes.push(vote.clone());
        Ok(vote)
    }

    fn has_voted(&self, identity: &Identity, date: NaiveDate) -> crate::error::Result<bool> {
        let inner = self.inner.read().map_err(|_| VotingError::Internal {
            message: "Failed to acquire ledger read lock".to_string(),
        })?;

        Ok(inner.index.contains(&(identity.key(), date)))
    }

    fn votes_for_date(&self, date: NaiveDate) -> crate::error::Result<Vec<Vote>> {
        let inner = self.inner.read().map_err(|_| VotingError::Internal {
            message: "Failed to acquire ledger read lock".to_string(),
        })?;

        Ok(inner
            .votes
            .iter()
            .filter(|v| v.comparison_date == date)
            .cloned()
            .collect())
    }

    fn count_by_company(&self) -> crate::error::Result<HashMap<CompanyId, u64>> {
        let inner = self.inner.read().map_err(|_| VotingError::Internal {
            message: "Failed to acquire ledger read lock".to_string(),
        })?;

        let mut counts = HashMap::new();
        for vote in &inner.votes {
            *counts.entry(vote.company_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn count_for_company(&self, company_id: CompanyId) -> crate::error::Result<u64> {
        let inner = self.inner.read().map_err(|_| VotingError::Internal {
            message: "Failed to acquire ledger read lock".to_string(),
        })?;

        Ok(inner
            .votes
            .iter()
            .filter(|v| v.company_id == company_id)
            .count() as u64)
    }
}

//! Vote-count reconciliation
//!
//! The cached per-company vote counter can drift from the ledger when a vote
//! is recorded but the rating mutation fails partway. The auditor detects that
//! drift and, on request, resets stored counts to ledger-derived truth.

use std::sync::Arc;

use tracing::{info, warn};

use crate::company::CompanyStore;
use crate::error::{Result, VotingError};
use crate::ledger::VoteStore;
use crate::types::VoteCountAudit;

/// Compares stored vote counters against the ledger and repairs drift
pub struct VoteCountAuditor {
    companies: Arc<dyn CompanyStore>,
    votes: Arc<dyn VoteStore>,
    max_update_retries: u32,
}

impl VoteCountAuditor {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        votes: Arc<dyn VoteStore>,
        max_update_retries: u32,
    ) -> Self {
        Self {
            companies,
            votes,
            max_update_retries,
        }
    }

    /// Report stored vs actual counts for every company
    pub async fn audit(&self) -> Result<Vec<VoteCountAudit>> {
        let actual_counts = self.votes.count_by_company()?;

        let mut rows = Vec::new();
        for company in self.companies.list()? {
            let actual = actual_counts.get(&company.id).copied().unwrap_or(0);
            let difference = company.votes as i64 - actual as i64;
            if difference != 0 {
                warn!(
                    "Vote count drift on company {} ('{}'): stored {}, ledger {}",
                    company.id, company.name, company.votes, actual
                );
            }

            rows.push(VoteCountAudit {
                company_id: company.id,
                name: company.name,
                stored_votes: company.votes,
                actual_votes: actual,
                difference,
            });
        }

        Ok(rows)
    }

    /// Reset drifted stored counts to the ledger-derived truth. Returns the
    /// rows that were repaired.
    pub async fn fix(&self) -> Result<Vec<VoteCountAudit>> {
        let drifted: Vec<VoteCountAudit> = self
            .audit()
            .await?
            .into_iter()
            .filter(|row| row.difference != 0)
            .collect();

        for row in &drifted {
            self.reset_stored_votes(row.company_id, row.actual_votes)?;
            info!(
                "Reset vote count for company {} ('{}') from {} to {}",
                row.company_id, row.name, row.stored_votes, row.actual_votes
            );
        }

        Ok(drifted)
    }

    fn reset_stored_votes(&self, company_id: u64, actual: u64) -> Result<()> {
        for _attempt in 1..=self.max_update_retries {
            let record = self
                .companies
                .get(company_id)?
                .ok_or(VotingError::CompanyNotFound { company_id })?;

            let mut updated = record.company.clone();
            updated.votes = actual;

            if self
                .companies
                .update_if_version(company_id, record.version, updated)?
            {
                return Ok(());
            }
        }

        Err(VotingError::StorageConflict {
            company_id,
            attempts: self.max_update_retries,
        }
        .into())
    }
}

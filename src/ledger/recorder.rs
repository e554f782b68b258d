//! Vote recording protocol
//!
//! Turns one validated user choice into the transactional rating mutation:
//! atomic ledger insert, before-snapshot, per-loser delta application, winner
//! update, and the per-company change report returned to the caller.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::company::{CompanyRecord, CompanyStore};
use crate::error::{Result, VotingError};
use crate::ledger::store::VoteStore;
use crate::metrics::MetricsCollector;
use crate::rating::RatingEngine;
use crate::types::{Company, CompanyId, EloChange, Identity};

/// Records votes and applies rating mutations
pub struct VoteRecorder {
    votes: Arc<dyn VoteStore>,
    companies: Arc<dyn CompanyStore>,
    engine: Arc<dyn RatingEngine>,
    metrics: Arc<MetricsCollector>,
    max_update_retries: u32,
}

impl VoteRecorder {
    pub fn new(
        votes: Arc<dyn VoteStore>,
        companies: Arc<dyn CompanyStore>,
        engine: Arc<dyn RatingEngine>,
        metrics: Arc<MetricsCollector>,
        max_update_retries: u32,
    ) -> Self {
        Self {
            votes,
            companies,
            engine,
            metrics,
            max_update_retries,
        }
    }

    /// Record one vote: the chosen company defeats every other company shown
    /// in the comparison, pairwise.
    ///
    /// Returns the before/after rating movement for every company in the
    /// comparison, winner included.
    pub async fn record_vote(
        &self,
        identity: Identity,
        company_id: CompanyId,
        date: NaiveDate,
        comparison_ids: &[CompanyId],
    ) -> Result<Vec<EloChange>> {
        self.validate_request(company_id, comparison_ids)?;

        // All companies must exist before anything is written, so a malformed
        // comparison cannot leave a dangling ledger row.
        let preflight = self.companies.get_many(comparison_ids)?;
        for id in comparison_ids {
            if !preflight.contains_key(id) {
                return Err(VotingError::CompanyNotFound { company_id: *id }.into());
            }
        }

        // Step 1: atomic check-and-insert into the ledger. Concurrent
        // submissions from the same identity serialize here; exactly one wins.
        let vote = match self.votes.insert(identity.clone(), company_id, date) {
            Ok(vote) => vote,
            Err(e) => {
                if let Some(VotingError::DuplicateVote { .. }) = e.downcast_ref::<VotingError>() {
                    self.metrics.record_duplicate_vote();
                    debug!(
                        "Duplicate vote rejected - identity: '{}', date: {}",
                        identity, date
                    );
                }
                return Err(e);
            }
        };

        info!(
            "Vote {} recorded - identity: '{}', winner: {}, date: {}, comparison: {:?}",
            vote.id, identity, company_id, date, comparison_ids
        );

        // Step 2: "before" snapshot, read just before the rating mutation
        let before = self.companies.get_many(comparison_ids)?;
        let winner_before = match before.get(&company_id) {
            Some(record) => record.clone(),
            None => {
                error!(
                    "Winner company {} disappeared after vote {} was recorded",
                    company_id, vote.id
                );
                return Err(VotingError::PartialFailure {
                    message: format!(
                        "Vote {} recorded but winner company {} no longer exists",
                        vote.id, company_id
                    ),
                }
                .into());
            }
        };

        // Steps 3-4: mutate every company. The vote row is already in the
        // ledger, so any failure from here on is repairable drift, not a lost
        // vote; the vote-count audit reconciles it.
        match self.apply_rating_updates(&winner_before, &before, comparison_ids) {
            Ok(total_gain) => {
                self.metrics.record_vote_recorded();
                debug!(
                    "Ratings updated for vote {} - winner {} gained {}",
                    vote.id, company_id, total_gain
                );
            }
            Err(e) => {
                // The ledger row stands even when the rating mutation fails,
                // so a retry of the same request would hit DuplicateVote. The
                // caller sees a partial failure, not a retryable conflict.
                if e.downcast_ref::<VotingError>()
                    .map(|ve| matches!(ve, VotingError::StorageConflict { .. }))
                    .unwrap_or(false)
                {
                    warn!(
                        "Rating update for vote {} hit a storage conflict; audit can reconcile",
                        vote.id
                    );
                } else {
                    error!("Rating update for vote {} failed: {}", vote.id, e);
                }
                return Err(VotingError::PartialFailure {
                    message: format!("Vote {} recorded but rating update failed: {}", vote.id, e),
                }
                .into());
            }
        }

        // Step 5: report per-company movement for the caller
        self.build_change_report(comparison_ids, &before)
    }

    fn validate_request(&self, company_id: CompanyId, comparison_ids: &[CompanyId]) -> Result<()> {
        if comparison_ids.len() < 2 {
            return Err(VotingError::InvalidInput {
                reason: format!(
                    "A comparison needs at least 2 companies, got {}",
                    comparison_ids.len()
                ),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for id in comparison_ids {
            if !seen.insert(*id) {
                return Err(VotingError::InvalidInput {
                    reason: format!("Company {} appears twice in the comparison", id),
                }
                .into());
            }
        }

        if !comparison_ids.contains(&company_id) {
            return Err(VotingError::InvalidInput {
                reason: format!(
                    "Chosen company {} is not part of the comparison",
                    company_id
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Apply the pairwise deltas: every non-chosen company loses its delta
    /// against the winner, the winner gains the sum. Deltas come from the
    /// before-snapshot; each write is a compare-and-swap against the live row.
    fn apply_rating_updates(
        &self,
        winner_before: &CompanyRecord,
        before: &HashMap<CompanyId, CompanyRecord>,
        comparison_ids: &[CompanyId],
    ) -> Result<i64> {
        let winner_id = winner_before.company.id;
        let winner_rating = winner_before.company.rating;
        let mut total_gain: i64 = 0;

        for company_id in comparison_ids {
            if *company_id == winner_id {
                continue;
            }

            let loser_before = before
                .get(company_id)
                .ok_or(VotingError::CompanyNotFound {
                    company_id: *company_id,
                })?;

            let delta = self
                .engine
                .compute_delta(winner_rating, loser_before.company.rating);
            total_gain += delta;

            // Losses never touch the loser's vote tally
            self.apply_with_retry(*company_id, |current| {
                let mut updated = current.clone();
                updated.rating = current.rating - delta;
                updated.win_percentage = self
                    .engine
                    .loser_win_percentage(current.win_percentage, current.votes);
                updated
            })?;
        }

        self.apply_with_retry(winner_id, |current| {
            let mut updated = current.clone();
            updated.rating = current.rating + total_gain;
            updated.votes = current.votes + 1;
            updated.win_percentage = self
                .engine
                .winner_win_percentage(current.win_percentage, current.votes);
            updated
        })?;

        Ok(total_gain)
    }

    /// Single-company read-modify-write with optimistic retry on version
    /// conflicts, bounded by the configured attempt count.
    fn apply_with_retry<F>(&self, company_id: CompanyId, mutate: F) -> Result<()>
    where
        F: Fn(&Company) -> Company,
    {
        for attempt in 1..=self.max_update_retries {
            let record = self
                .companies
                .get(company_id)?
                .ok_or(VotingError::CompanyNotFound { company_id })?;

            let updated = mutate(&record.company);
            if self
                .companies
                .update_if_version(company_id, record.version, updated)?
            {
                if attempt > 1 {
                    debug!(
                        "Company {} updated after {} attempts",
                        company_id, attempt
                    );
                }
                return Ok(());
            }

            self.metrics.record_update_conflict();
            debug!(
                "Version conflict updating company {} (attempt {}/{})",
                company_id, attempt, self.max_update_retries
            );
        }

        Err(VotingError::StorageConflict {
            company_id,
            attempts: self.max_update_retries,
        }
        .into())
    }

    fn build_change_report(
        &self,
        comparison_ids: &[CompanyId],
        before: &HashMap<CompanyId, CompanyRecord>,
    ) -> Result<Vec<EloChange>> {
        let after = self.companies.get_many(comparison_ids)?;

        let mut changes = Vec::with_capacity(comparison_ids.len());
        for company_id in comparison_ids {
            let before_record = before
                .get(company_id)
                .ok_or(VotingError::CompanyNotFound {
                    company_id: *company_id,
                })?;
            let after_record = after.get(company_id).ok_or(VotingError::CompanyNotFound {
                company_id: *company_id,
            })?;

            changes.push(EloChange {
                id: *company_id,
                name: after_record.company.name.clone(),
                before: before_record.company.rating,
                after: after_record.company.rating,
                change: after_record.company.rating - before_record.company.rating,
                votes: after_record.company.votes,
            });
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::InMemoryCompanyStore;
    use crate::ledger::store::InMemoryVoteStore;
    use crate::rating::EloRatingEngine;
    use crate::types::NewCompany;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    struct Harness {
        recorder: VoteRecorder,
        companies: Arc<InMemoryCompanyStore>,
        votes: Arc<InMemoryVoteStore>,
    }

    fn harness(ratings: &[i64]) -> (Harness, Vec<CompanyId>) {
        let companies = Arc::new(InMemoryCompanyStore::new());
        let votes = Arc::new(InMemoryVoteStore::new());

        let mut ids = Vec::new();
        for (i, rating) in ratings.iter().enumerate() {
            let company = companies
                .create(
                    NewCompany {
                        name: format!("Company {}", i),
                        logo: String::new(),
                        rating: Some(*rating),
                        votes: None,
                        win_percentage: None,
                    },
                    1500,
                )
                .unwrap();
            ids.push(company.id);
        }

        let recorder = VoteRecorder::new(
            votes.clone(),
            companies.clone(),
            Arc::new(EloRatingEngine::default()),
            Arc::new(MetricsCollector::default()),
            5,
        );

        (
            Harness {
                recorder,
                companies,
                votes,
            },
            ids,
        )
    }

    #[tokio::test]
    async fn test_two_way_vote_moves_ratings_symmetrically() {
        let (h, ids) = harness(&[1500, 1500]);

        let changes = h
            .recorder
            .record_vote(Identity::User("u-1".to_string()), ids[0], date(), &ids)
            .await
            .unwrap();

        let winner = h.companies.get(ids[0]).unwrap().unwrap().company;
        let loser = h.companies.get(ids[1]).unwrap().unwrap().company;

        assert_eq!(winner.rating, 1516);
        assert_eq!(winner.votes, 1);
        assert_eq!(winner.win_percentage, 100);
        assert_eq!(loser.rating, 1484);
        assert_eq!(loser.votes, 0);
        assert_eq!(loser.win_percentage, 0);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change, 16);
        assert_eq!(changes[1].change, -16);
        assert_eq!(changes[0].before, 1500);
        assert_eq!(changes[0].after, 1516);
    }

    #[tokio::test]
    async fn test_multi_way_winner_gains_sum_of_pairwise_deltas() {
        let (h, ids) = harness(&[1500, 1500, 1700]);

        h.recorder
            .record_vote(Identity::User("u-1".to_string()), ids[0], date(), &ids)
            .await
            .unwrap();

        let engine = EloRatingEngine::default();
        let d1 = engine.compute_delta(1500, 1500);
        let d2 = engine.compute_delta(1500, 1700);

        let winner = h.companies.get(ids[0]).unwrap().unwrap().company;
        let loser_equal = h.companies.get(ids[1]).unwrap().unwrap().company;
        let loser_strong = h.companies.get(ids[2]).unwrap().unwrap().company;

        assert_eq!(winner.rating, 1500 + d1 + d2);
        assert_eq!(loser_equal.rating, 1500 - d1);
        assert_eq!(loser_strong.rating, 1700 - d2);
        // Non-chosen companies are never compared against each other
        assert_eq!(loser_equal.votes, 0);
        assert_eq!(loser_strong.votes, 0);
    }

    #[tokio::test]
    async fn test_duplicate_vote_leaves_ratings_untouched() {
        let (h, ids) = harness(&[1500, 1500]);
        let identity = Identity::Anonymous("client-9".to_string());

        h.recorder
            .record_vote(identity.clone(), ids[0], date(), &ids)
            .await
            .unwrap();

        let err = h
            .recorder
            .record_vote(identity, ids[1], date(), &ids)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VotingError>().unwrap(),
            VotingError::DuplicateVote { .. }
        ));

        // State reflects exactly one vote
        let first = h.companies.get(ids[0]).unwrap().unwrap().company;
        let second = h.companies.get(ids[1]).unwrap().unwrap().company;
        assert_eq!(first.rating, 1516);
        assert_eq!(second.rating, 1484);
        assert_eq!(h.votes.votes_for_date(date()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_winner_outside_comparison() {
        let (h, ids) = harness(&[1500, 1500, 1500]);

        let err = h
            .recorder
            .record_vote(
                Identity::User("u-1".to_string()),
                ids[2],
                date(),
                &ids[..2],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VotingError>().unwrap(),
            VotingError::InvalidInput { .. }
        ));
        assert!(h.votes.votes_for_date(date()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_single_company_comparison() {
        let (h, ids) = harness(&[1500]);

        let err = h
            .recorder
            .record_vote(Identity::User("u-1".to_string()), ids[0], date(), &ids)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VotingError>().unwrap(),
            VotingError::InvalidInput { .. }
        ));
    }

    #[tokio::test]
    async fn test_rejects_repeated_company_in_comparison() {
        let (h, ids) = harness(&[1500, 1500]);
        let repeated = vec![ids[0], ids[0]];

        let err = h
            .recorder
            .record_vote(Identity::User("u-1".to_string()), ids[0], date(), &repeated)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VotingError>().unwrap(),
            VotingError::InvalidInput { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_company_fails_before_ledger_write() {
        let (h, ids) = harness(&[1500, 1500]);
        let bogus = vec![ids[0], 999];

        let err = h
            .recorder
            .record_vote(Identity::User("u-1".to_string()), ids[0], date(), &bogus)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VotingError>().unwrap(),
            VotingError::CompanyNotFound { company_id: 999 }
        ));
        assert!(h.votes.votes_for_date(date()).unwrap().is_empty());
    }

    /// Wraps a real store but reports every version check as stale, so the
    /// recorder's retry loop always exhausts.
    struct ContendedCompanyStore {
        inner: InMemoryCompanyStore,
    }

    impl CompanyStore for ContendedCompanyStore {
        fn create(
            &self,
            new_company: NewCompany,
            default_rating: i64,
        ) -> crate::error::Result<Company> {
            self.inner.create(new_company, default_rating)
        }

        fn get(&self, company_id: CompanyId) -> crate::error::Result<Option<CompanyRecord>> {
            self.inner.get(company_id)
        }

        fn get_many(
            &self,
            company_ids: &[CompanyId],
        ) -> crate::error::Result<HashMap<CompanyId, CompanyRecord>> {
            self.inner.get_many(company_ids)
        }

        fn list(&self) -> crate::error::Result<Vec<Company>> {
            self.inner.list()
        }

        fn count(&self) -> crate::error::Result<usize> {
            self.inner.count()
        }

        fn update_if_version(
            &self,
            _company_id: CompanyId,
            _expected_version: u64,
            _company: Company,
        ) -> crate::error::Result<bool> {
            Ok(false)
        }

        fn remove(&self, company_id: CompanyId) -> crate::error::Result<bool> {
            self.inner.remove(company_id)
        }
    }

    #[tokio::test]
    async fn test_exhausted_retries_after_ledger_write_surface_as_partial_failure() {
        let companies = Arc::new(ContendedCompanyStore {
            inner: InMemoryCompanyStore::new(),
        });
        let votes = Arc::new(InMemoryVoteStore::new());

        let mut ids = Vec::new();
        for name in ["Acme", "Globex"] {
            let company = companies
                .create(
                    NewCompany {
                        name: name.to_string(),
                        logo: String::new(),
                        rating: None,
                        votes: None,
                        win_percentage: None,
                    },
                    1500,
                )
                .unwrap();
            ids.push(company.id);
        }

        let recorder = VoteRecorder::new(
            votes.clone(),
            companies,
            Arc::new(EloRatingEngine::default()),
            Arc::new(MetricsCollector::default()),
            5,
        );

        let err = recorder
            .record_vote(Identity::User("u-1".to_string()), ids[0], date(), &ids)
            .await
            .unwrap_err();

        // The vote is in the ledger, so the caller must not be told to retry
        assert!(matches!(
            err.downcast_ref::<VotingError>().unwrap(),
            VotingError::PartialFailure { .. }
        ));
        assert_eq!(votes.votes_for_date(date()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_win_percentage_only_counts_wins() {
        let (h, ids) = harness(&[1500, 1500]);

        // Three different voters, all choosing the first company
        for i in 0..3 {
            h.recorder
                .record_vote(Identity::User(format!("u-{}", i)), ids[0], date(), &ids)
                .await
                .unwrap();
        }

        let winner = h.companies.get(ids[0]).unwrap().unwrap().company;
        let loser = h.companies.get(ids[1]).unwrap().unwrap().company;

        assert_eq!(winner.votes, 3);
        assert_eq!(winner.win_percentage, 100);
        // Appearing as the non-chosen alternative never moves the tally
        assert_eq!(loser.votes, 0);
        assert_eq!(loser.win_percentage, 0);
    }
}

//! Daily aggregation of votes into historical rating snapshots
//!
//! The aggregator locks in one `RatingSnapshot` per company for a processed
//! date. Re-running for the same date overwrites rows rather than
//! accumulating, so a partially failed run is recovered by running again.

pub mod history;

pub use history::{HistoryStore, InMemoryHistoryStore};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::company::CompanyStore;
use crate::error::Result;
use crate::ledger::VoteStore;
use crate::metrics::MetricsCollector;
use crate::types::{DailyUpdate, RatingSnapshot};
use crate::utils::yesterday_utc;

/// Produces finalized per-day rating history from the vote ledger
pub struct DailyAggregator {
    companies: Arc<dyn CompanyStore>,
    votes: Arc<dyn VoteStore>,
    history: Arc<dyn HistoryStore>,
    metrics: Arc<MetricsCollector>,
}

impl DailyAggregator {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        votes: Arc<dyn VoteStore>,
        history: Arc<dyn HistoryStore>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            companies,
            votes,
            history,
            metrics,
        }
    }

    /// Write or overwrite one snapshot per company for `date` (yesterday UTC
    /// when unspecified) and return audit rows for the run.
    ///
    /// Every company gets a row: companies untouched that day carry the
    /// previous snapshot forward with a zero change, companies that received
    /// votes snapshot the live store state.
    pub async fn process_daily_updates(&self, date: Option<NaiveDate>) -> Result<Vec<DailyUpdate>> {
        let target = date.unwrap_or_else(yesterday_utc);

        let day_votes = self.votes.votes_for_date(target)?;
        let voted: HashSet<_> = day_votes.iter().map(|v| v.company_id).collect();
        info!(
            "Processing daily updates for {} - {} votes across {} companies",
            target,
            day_votes.len(),
            voted.len()
        );

        let previous_day = target.pred_opt().unwrap_or(target);
        let mut updates = Vec::new();

        for company in self.companies.list()? {
            let previous = self.history.get(company.id, previous_day)?;

            let snapshot = if voted.contains(&company.id) {
                // Before any snapshot exists the registration rating is the
                // baseline, so the first aggregated day still reports the
                // movement the day's votes produced
                let previous_rating = match previous.as_ref() {
                    Some(s) => s.rating,
                    None => self
                        .companies
                        .get(company.id)?
                        .map(|record| record.initial_rating)
                        .unwrap_or(company.rating),
                };

                RatingSnapshot {
                    company_id: company.id,
                    date: target,
                    rating: company.rating,
                    votes: company.votes,
                    win_percentage: company.win_percentage,
                    daily_change: company.rating - previous_rating,
                }
            } else {
                // Untouched that day: carry the prior snapshot forward
                let (rating, votes, win_percentage) = match &previous {
                    Some(s) => (s.rating, s.votes, s.win_percentage),
                    None => (company.rating, company.votes, company.win_percentage),
                };

                RatingSnapshot {
                    company_id: company.id,
                    date: target,
                    rating,
                    votes,
                    win_percentage,
                    daily_change: 0,
                }
            };

            debug!(
                "Snapshot for company {} on {}: rating {}, change {}",
                company.id, target, snapshot.rating, snapshot.daily_change
            );

            updates.push(DailyUpdate {
                company_id: company.id,
                previous_rating: snapshot.rating - snapshot.daily_change,
                current_rating: snapshot.rating,
                daily_change: snapshot.daily_change,
            });
            self.history.upsert(snapshot)?;
        }

        self.metrics.record_aggregator_run();
        info!(
            "Daily updates for {} complete - {} snapshot rows written",
            target,
            updates.len()
        );
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::InMemoryCompanyStore;
    use crate::ledger::store::InMemoryVoteStore;
    use crate::ledger::VoteRecorder;
    use crate::rating::EloRatingEngine;
    use crate::types::{Identity, NewCompany};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    struct Harness {
        aggregator: DailyAggregator,
        recorder: VoteRecorder,
        history: Arc<InMemoryHistoryStore>,
        ids: Vec<u64>,
    }

    fn harness() -> Harness {
        let companies = Arc::new(InMemoryCompanyStore::new());
        let votes = Arc::new(InMemoryVoteStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let metrics = Arc::new(MetricsCollector::default());

        let mut ids = Vec::new();
        for name in ["Acme", "Globex", "Initech"] {
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
            companies.clone(),
            Arc::new(EloRatingEngine::default()),
            metrics.clone(),
            5,
        );

        let aggregator = DailyAggregator::new(companies, votes, history.clone(), metrics);

        Harness {
            aggregator,
            recorder,
            history,
            ids,
        }
    }

    #[tokio::test]
    async fn test_snapshot_written_for_every_company() {
        let h = harness();
        let pair = vec![h.ids[0], h.ids[1]];

        h.recorder
            .record_vote(Identity::User("u-1".to_string()), h.ids[0], date(), &pair)
            .await
            .unwrap();

        let updates = h.aggregator.process_daily_updates(Some(date())).await.unwrap();
        assert_eq!(updates.len(), 3);

        let winner = h.history.get(h.ids[0], date()).unwrap().unwrap();
        assert_eq!(winner.rating, 1516);
        assert_eq!(winner.votes, 1);

        // The untouched company gets a zero-change row
        let untouched = h.history.get(h.ids[2], date()).unwrap().unwrap();
        assert_eq!(untouched.daily_change, 0);
    }

    #[tokio::test]
    async fn test_first_aggregated_day_reports_movement() {
        let h = harness();
        let pair = vec![h.ids[0], h.ids[1]];

        h.recorder
            .record_vote(Identity::User("u-1".to_string()), h.ids[0], date(), &pair)
            .await
            .unwrap();

        // No snapshot exists yet, so the registration rating is the baseline
        let updates = h.aggregator.process_daily_updates(Some(date())).await.unwrap();
        let winner_update = updates.iter().find(|u| u.company_id == h.ids[0]).unwrap();
        assert_eq!(winner_update.previous_rating, 1500);
        assert_eq!(winner_update.current_rating, 1516);
        assert_eq!(winner_update.daily_change, 16);

        let snapshot = h.history.get(h.ids[0], date()).unwrap().unwrap();
        assert_eq!(snapshot.daily_change, 16);
    }

    #[tokio::test]
    async fn test_first_day_baseline_uses_custom_seed_rating() {
        let companies = Arc::new(InMemoryCompanyStore::new());
        let votes = Arc::new(InMemoryVoteStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let metrics = Arc::new(MetricsCollector::default());

        let seeded = companies
            .create(
                NewCompany {
                    name: "Vandelay".to_string(),
                    logo: String::new(),
                    rating: Some(1600),
                    votes: None,
                    win_percentage: None,
                },
                1500,
            )
            .unwrap();
        let rival = companies
            .create(
                NewCompany {
                    name: "Hooli".to_string(),
                    logo: String::new(),
                    rating: None,
                    votes: None,
                    win_percentage: None,
                },
                1500,
            )
            .unwrap();

        let recorder = VoteRecorder::new(
            votes.clone(),
            companies.clone(),
            Arc::new(EloRatingEngine::default()),
            metrics.clone(),
            5,
        );
        let aggregator = DailyAggregator::new(companies, votes, history, metrics);

        recorder
            .record_vote(
                Identity::User("u-1".to_string()),
                seeded.id,
                date(),
                &[seeded.id, rival.id],
            )
            .await
            .unwrap();

        let updates = aggregator.process_daily_updates(Some(date())).await.unwrap();
        let winner_update = updates.iter().find(|u| u.company_id == seeded.id).unwrap();
        // 1600 vs 1500 favorite wins; the seed rating is the baseline
        assert_eq!(winner_update.previous_rating, 1600);
        assert_eq!(winner_update.daily_change, winner_update.current_rating - 1600);
        assert!(winner_update.daily_change > 0);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let h = harness();
        let pair = vec![h.ids[0], h.ids[1]];

        h.recorder
            .record_vote(Identity::User("u-1".to_string()), h.ids[0], date(), &pair)
            .await
            .unwrap();

        let first = h.aggregator.process_daily_updates(Some(date())).await.unwrap();
        let first_rows = h.history.for_date(date()).unwrap();

        let second = h.aggregator.process_daily_updates(Some(date())).await.unwrap();
        let second_rows = h.history.for_date(date()).unwrap();

        assert_eq!(first.len(), second.len());
        assert_eq!(first_rows.len(), second_rows.len());
        for (a, b) in first_rows.iter().zip(second_rows.iter()) {
            assert_eq!(a.company_id, b.company_id);
            assert_eq!(a.rating, b.rating);
            assert_eq!(a.votes, b.votes);
            assert_eq!(a.daily_change, b.daily_change);
        }
    }

    #[tokio::test]
    async fn test_daily_change_measured_against_previous_snapshot() {
        let h = harness();
        let pair = vec![h.ids[0], h.ids[1]];
        let day_one = date();
        let day_two = day_one.succ_opt().unwrap();

        h.recorder
            .record_vote(Identity::User("u-1".to_string()), h.ids[0], day_one, &pair)
            .await
            .unwrap();
        h.aggregator
            .process_daily_updates(Some(day_one))
            .await
            .unwrap();

        h.recorder
            .record_vote(Identity::User("u-2".to_string()), h.ids[0], day_two, &pair)
            .await
            .unwrap();
        let updates = h
            .aggregator
            .process_daily_updates(Some(day_two))
            .await
            .unwrap();

        let winner_update = updates
            .iter()
            .find(|u| u.company_id == h.ids[0])
            .unwrap();
        assert_eq!(winner_update.previous_rating, 1516);
        assert!(winner_update.current_rating > 1516);
        assert_eq!(
            winner_update.daily_change,
            winner_update.current_rating - winner_update.previous_rating
        );
    }

    #[tokio::test]
    async fn test_empty_day_produces_zero_change_rows() {
        let h = harness();

        let updates = h.aggregator.process_daily_updates(Some(date())).await.unwrap();
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|u| u.daily_change == 0));
    }
}

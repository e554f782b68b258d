//! Test fixtures for integration testing

use prestige_check::aggregator::{DailyAggregator, HistoryStore, InMemoryHistoryStore};
use prestige_check::audit::VoteCountAuditor;
use prestige_check::company::{CompanyStore, InMemoryCompanyStore};
use prestige_check::config::EloConfig;
use prestige_check::ledger::{InMemoryVoteStore, VoteRecorder, VoteStore};
use prestige_check::metrics::MetricsCollector;
use prestige_check::rating::EloRatingEngine;
use prestige_check::selector::{DailySelector, InMemoryScheduleStore, ScheduleStore};
use prestige_check::types::{Company, NewCompany};
use std::sync::Arc;

/// A fully wired voting system backed by in-memory stores
pub struct TestSystem {
    pub companies: Arc<dyn CompanyStore>,
    pub votes: Arc<dyn VoteStore>,
    pub history: Arc<dyn HistoryStore>,
    pub schedule: Arc<dyn ScheduleStore>,
    pub recorder: Arc<VoteRecorder>,
    pub aggregator: DailyAggregator,
    pub selector: DailySelector,
    pub auditor: VoteCountAuditor,
    pub metrics: Arc<MetricsCollector>,
}

pub fn create_test_system() -> TestSystem {
    let config = EloConfig::default();

    let companies: Arc<dyn CompanyStore> = Arc::new(InMemoryCompanyStore::new());
    let votes: Arc<dyn VoteStore> = Arc::new(InMemoryVoteStore::new());
    let history: Arc<dyn HistoryStore> = Arc::new(InMemoryHistoryStore::new());
    let schedule: Arc<dyn ScheduleStore> = Arc::new(InMemoryScheduleStore::new());

    let engine = Arc::new(EloRatingEngine::new(config.clone()).unwrap());
    let metrics = Arc::new(MetricsCollector::new().unwrap());

    let recorder = Arc::new(VoteRecorder::new(
        votes.clone(),
        companies.clone(),
        engine,
        metrics.clone(),
        config.max_update_retries,
    ));
    let aggregator = DailyAggregator::new(
        companies.clone(),
        votes.clone(),
        history.clone(),
        metrics.clone(),
    );
    let selector = DailySelector::new(schedule.clone(), companies.clone());
    let auditor = VoteCountAuditor::new(companies.clone(), votes.clone(), config.max_update_retries);

    TestSystem {
        companies,
        votes,
        history,
        schedule,
        recorder,
        aggregator,
        selector,
        auditor,
        metrics,
    }
}

impl TestSystem {
    /// Register companies at the given ratings, returning them in id order
    pub fn seed_companies(&self, seeds: &[(&str, i64)]) -> Vec<Company> {
        seeds
            .iter()
            .map(|(name, rating)| {
                self.companies
                    .create(
                        NewCompany {
                            name: name.to_string(),
                            logo: format!("/logos/{}.svg", name.to_lowercase()),
                            rating: Some(*rating),
                            votes: None,
                            win_percentage: None,
                        },
                        1500,
                    )
                    .unwrap()
            })
            .collect()
    }
}

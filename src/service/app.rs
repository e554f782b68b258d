//! Main application state and service coordination
//!
//! This module contains the production AppState that wires together the
//! company store, vote ledger, rating engine, and background tasks.

use crate::aggregator::{DailyAggregator, HistoryStore, InMemoryHistoryStore};
use crate::audit::VoteCountAuditor;
use crate::company::{CompanyStore, InMemoryCompanyStore};
use crate::config::AppConfig;
use crate::error::{Result, VotingError};
use crate::ledger::{InMemoryVoteStore, VoteRecorder, VoteStore};
use crate::metrics::MetricsCollector;
use crate::rating::EloRatingEngine;
use crate::selector::{DailySelector, InMemoryScheduleStore, ScheduleStore};
use crate::types::{Company, CompanyId, NewCompany};
use crate::utils::yesterday_utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Coordinates all service components and owns the background rollup task
pub struct AppState {
    config: AppConfig,
    companies: Arc<dyn CompanyStore>,
    votes: Arc<dyn VoteStore>,
    history: Arc<dyn HistoryStore>,
    schedule: Arc<dyn ScheduleStore>,
    selector: DailySelector,
    recorder: VoteRecorder,
    aggregator: DailyAggregator,
    auditor: VoteCountAuditor,
    metrics: Arc<MetricsCollector>,
    started_at: Instant,
    rollup_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Initialize all components from configuration and seed the company roster
    pub async fn new(config: AppConfig) -> Result<Self> {
        crate::config::validate_config(&config)?;

        let companies: Arc<dyn CompanyStore> = Arc::new(InMemoryCompanyStore::new());
        let votes: Arc<dyn VoteStore> = Arc::new(InMemoryVoteStore::new());
        let history: Arc<dyn HistoryStore> = Arc::new(InMemoryHistoryStore::new());
        let schedule: Arc<dyn ScheduleStore> = Arc::new(InMemoryScheduleStore::new());

        let engine = Arc::new(EloRatingEngine::new(config.elo.clone())?);
        let metrics = Arc::new(MetricsCollector::new()?);

        for seed in &config.companies {
            let new_company = NewCompany {
                name: seed.name.clone(),
                logo: seed.logo.clone(),
                rating: seed.rating,
                votes: seed.votes,
                win_percentage: seed.win_percentage,
            };
            let company = companies.create(new_company, config.elo.initial_rating)?;
            info!(
                "Seeded company '{}' (id: {}, rating: {})",
                company.name, company.id, company.rating
            );
        }
        metrics.set_company_count(companies.count()?);

        let selector = DailySelector::new(schedule.clone(), companies.clone());
        let recorder = VoteRecorder::new(
            votes.clone(),
            companies.clone(),
            engine,
            metrics.clone(),
            config.elo.max_update_retries,
        );
        let aggregator = DailyAggregator::new(
            companies.clone(),
            votes.clone(),
            history.clone(),
            metrics.clone(),
        );
        let auditor = VoteCountAuditor::new(
            companies.clone(),
            votes.clone(),
            config.elo.max_update_retries,
        );

        Ok(Self {
            config,
            companies,
            votes,
            history,
            schedule,
            selector,
            recorder,
            aggregator,
            auditor,
            metrics,
            started_at: Instant::now(),
            rollup_task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn companies(&self) -> &Arc<dyn CompanyStore> {
        &self.companies
    }

    pub fn votes(&self) -> &Arc<dyn VoteStore> {
        &self.votes
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn schedule(&self) -> &Arc<dyn ScheduleStore> {
        &self.schedule
    }

    pub fn selector(&self) -> &DailySelector {
        &self.selector
    }

    pub fn recorder(&self) -> &VoteRecorder {
        &self.recorder
    }

    pub fn aggregator(&self) -> &DailyAggregator {
        &self.aggregator
    }

    pub fn auditor(&self) -> &VoteCountAuditor {
        &self.auditor
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Add a company to the roster at the configured initial rating
    pub async fn register_company(&self, new_company: NewCompany) -> Result<Company> {
        let company = self
            .companies
            .create(new_company, self.config.elo.initial_rating)?;
        self.metrics.set_company_count(self.companies.count()?);
        info!(
            "Registered company '{}' (id: {}, rating: {})",
            company.name, company.id, company.rating
        );
        Ok(company)
    }

    /// Remove a company. Refused while the ledger still references it, so
    /// historical vote rows never point at a missing company.
    pub async fn remove_company(&self, company_id: CompanyId) -> Result<bool> {
        let referenced = self.votes.count_for_company(company_id)?;
        if referenced > 0 {
            return Err(VotingError::InvalidInput {
                reason: format!(
                    "company {} has {} recorded votes and cannot be removed",
                    company_id, referenced
                ),
            }
            .into());
        }

        let removed = self.companies.remove(company_id)?;
        if removed {
            self.metrics.set_company_count(self.companies.count()?);
            info!("Removed company {}", company_id);
        }
        Ok(removed)
    }

    /// Spawn the periodic rollup task when enabled in configuration
    pub async fn start(self: &Arc<Self>) {
        if !self.config.voting.enable_daily_rollup {
            info!("Daily rollup task disabled by configuration");
            return;
        }

        let state = self.clone();
        let handle = tokio::spawn(async move {
            state.rollup_loop().await;
        });

        let mut guard = self.rollup_task.lock().await;
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
        info!(
            "Daily rollup task started (check interval: {}s)",
            self.config.voting.rollup_check_interval_seconds
        );
    }

    /// Stop background tasks
    pub async fn shutdown(&self) {
        let mut guard = self.rollup_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
            info!("Daily rollup task stopped");
        }
    }

    async fn rollup_loop(&self) {
        let mut interval = tokio::time::interval(self.config.rollup_check_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_processed = None;

        loop {
            interval.tick().await;

            let target = yesterday_utc();
            if last_processed == Some(target) {
                continue;
            }

            match self.aggregator.process_daily_updates(Some(target)).await {
                Ok(updates) => {
                    info!(
                        "Daily rollup for {} produced {} snapshot rows",
                        target,
                        updates.len()
                    );
                    last_processed = Some(target);
                }
                Err(e) => {
                    error!("Daily rollup for {} failed: {}", target, e);
                }
            }
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.config.service.name)
            .field("uptime_seconds", &self.uptime_seconds())
            .finish()
    }
}

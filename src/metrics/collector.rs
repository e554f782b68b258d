//! Prometheus metrics collector

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Collects vote and aggregation metrics into a dedicated registry
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    /// Votes accepted and fully applied
    votes_recorded_total: IntCounter,
    /// Repeat submissions rejected by the one-vote-per-day guarantee
    duplicate_votes_total: IntCounter,
    /// Optimistic-concurrency conflicts hit while applying rating updates
    update_conflicts_total: IntCounter,
    /// Daily aggregation runs completed
    aggregator_runs_total: IntCounter,
    /// Currently registered companies
    companies_registered: IntGauge,
}

impl MetricsCollector {
    /// Create a new collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let votes_recorded_total = IntCounter::new(
            "prestige_check_votes_recorded_total",
            "Votes accepted and fully applied to ratings",
        )?;
        registry.register(Box::new(votes_recorded_total.clone()))?;

        let duplicate_votes_total = IntCounter::new(
            "prestige_check_duplicate_votes_total",
            "Vote submissions rejected because the identity already voted that day",
        )?;
        registry.register(Box::new(duplicate_votes_total.clone()))?;

        let update_conflicts_total = IntCounter::new(
            "prestige_check_update_conflicts_total",
            "Version conflicts encountered while applying rating updates",
        )?;
        registry.register(Box::new(update_conflicts_total.clone()))?;

        let aggregator_runs_total = IntCounter::new(
            "prestige_check_aggregator_runs_total",
            "Completed daily aggregation runs",
        )?;
        registry.register(Box::new(aggregator_runs_total.clone()))?;

        let companies_registered = IntGauge::new(
            "prestige_check_companies_registered",
            "Number of registered companies",
        )?;
        registry.register(Box::new(companies_registered.clone()))?;

        Ok(Self {
            registry,
            votes_recorded_total,
            duplicate_votes_total,
            update_conflicts_total,
            aggregator_runs_total,
            companies_registered,
        })
    }

    pub fn record_vote_recorded(&self) {
        self.votes_recorded_total.inc();
    }

    pub fn record_duplicate_vote(&self) {
        self.duplicate_votes_total.inc();
    }

    pub fn record_update_conflict(&self) {
        self.update_conflicts_total.inc();
    }

    pub fn record_aggregator_run(&self) {
        self.aggregator_runs_total.inc();
    }

    pub fn set_company_count(&self, count: usize) {
        self.companies_registered.set(count as i64);
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

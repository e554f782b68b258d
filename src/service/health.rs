//! Health check endpoint support
//!
//! Reports overall service status plus the counters a liveness probe or
//! an operator cares about at a glance.

use crate::service::app::AppState;
use crate::utils::today_utc;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Companies currently in the roster
    pub companies: usize,
    /// Votes recorded today (UTC)
    pub votes_today: usize,
    /// Seconds since the service started
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Inspect the stores and build a health report. A roster too small to
    /// pair companies is degraded, not unhealthy; votes are simply refused
    /// until companies are registered.
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let companies = app_state.companies().count()?;
        let votes_today = app_state.votes().votes_for_date(today_utc())?.len();

        let status = if companies >= 2 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        debug!(
            "Health check: {} ({} companies, {} votes today)",
            status, companies, votes_today
        );

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            stats: ServiceStats {
                companies,
                votes_today,
                uptime_seconds: app_state.uptime_seconds(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, CompanySeed};

    fn seed(name: &str) -> CompanySeed {
        CompanySeed {
            name: name.to_string(),
            logo: String::new(),
            rating: None,
            votes: None,
            win_percentage: None,
        }
    }

    #[tokio::test]
    async fn test_healthy_with_pairable_roster() {
        let mut config = AppConfig::default();
        config.companies = vec![seed("Acme"), seed("Globex")];
        let state = Arc::new(AppState::new(config).await.unwrap());

        let health = HealthCheck::check(state).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.stats.companies, 2);
        assert_eq!(health.stats.votes_today, 0);
    }

    #[tokio::test]
    async fn test_degraded_with_empty_roster() {
        let state = Arc::new(AppState::new(AppConfig::default()).await.unwrap());

        let health = HealthCheck::check(state).await.unwrap();
        assert_eq!(health.status, HealthStatus::Degraded);
    }
}

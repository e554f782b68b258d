//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! prestige-check voting service, including environment variable loading,
//! TOML file loading, and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::config::rating::EloConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub http: HttpSettings,
    pub voting: VotingSettings,
    pub elo: EloConfig,
    /// Companies registered at startup (file-based config only)
    pub companies: Vec<CompanySeed>,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
    /// Port for the voting API, health and metrics endpoints
    pub port: u16,
}

/// Voting-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingSettings {
    /// Run the daily rollup task that aggregates yesterday's votes
    pub enable_daily_rollup: bool,
    /// How often the rollup task checks whether the UTC day has changed
    pub rollup_check_interval_seconds: u64,
}

/// A company registered at startup from the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySeed {
    pub name: String,
    #[serde(default)]
    pub logo: String,
    pub rating: Option<i64>,
    pub votes: Option<u64>,
    pub win_percentage: Option<u8>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "prestige-check".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for VotingSettings {
    fn default() -> Self {
        Self {
            enable_daily_rollup: true,
            rollup_check_interval_seconds: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // HTTP settings
        if let Ok(host) = env::var("HTTP_HOST") {
            config.http.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            config.http.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }

        // Voting settings
        if let Ok(rollup) = env::var("ENABLE_DAILY_ROLLUP") {
            config.voting.enable_daily_rollup = rollup
                .parse()
                .map_err(|_| anyhow!("Invalid ENABLE_DAILY_ROLLUP value: {}", rollup))?;
        }
        if let Ok(interval) = env::var("ROLLUP_CHECK_INTERVAL_SECONDS") {
            config.voting.rollup_check_interval_seconds = interval.parse().map_err(|_| {
                anyhow!("Invalid ROLLUP_CHECK_INTERVAL_SECONDS value: {}", interval)
            })?;
        }

        // ELO settings
        if let Ok(k) = env::var("ELO_K_FACTOR") {
            config.elo.k_factor = k
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_K_FACTOR value: {}", k))?;
        }
        if let Ok(initial) = env::var("ELO_INITIAL_RATING") {
            config.elo.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_INITIAL_RATING value: {}", initial))?;
        }
        if let Ok(retries) = env::var("ELO_MAX_UPDATE_RETRIES") {
            config.elo.max_update_retries = retries
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_MAX_UPDATE_RETRIES value: {}", retries))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file {}", path.as_ref().display())
        })?;

        let config: Self = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse config file {}", path.as_ref().display())
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get rollup check interval as Duration
    pub fn rollup_check_interval(&self) -> Duration {
        Duration::from_secs(self.voting.rollup_check_interval_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports and timeouts
    if config.http.port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.voting.rollup_check_interval_seconds == 0 {
        return Err(anyhow!("Rollup check interval must be greater than 0"));
    }

    config.elo.validate()?;

    // Validate seed companies
    for seed in &config.companies {
        if seed.name.is_empty() {
            return Err(anyhow!("Seed company name cannot be empty"));
        }
        if let Some(pct) = seed.win_percentage {
            if pct > 100 {
                return Err(anyhow!(
                    "Seed company '{}' win percentage out of range: {}",
                    seed.name,
                    pct
                ));
            }
        }
    }

    Ok(())
}

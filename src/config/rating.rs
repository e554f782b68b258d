//! ELO rating configuration

use serde::{Deserialize, Serialize};

use crate::error::VotingError;

/// Parameters of the ELO update protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloConfig {
    /// Sensitivity constant controlling how much a single vote moves a rating
    pub k_factor: f64,
    /// Rating assigned to newly registered companies
    pub initial_rating: i64,
    /// Bounded retries for conflicting rating updates before giving up
    pub max_update_retries: u32,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: 1500,
            max_update_retries: 5,
        }
    }
}

impl EloConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.k_factor <= 0.0 {
            return Err(VotingError::Configuration {
                message: "K-factor must be positive".to_string(),
            }
            .into());
        }

        if self.max_update_retries == 0 {
            return Err(VotingError::Configuration {
                message: "Max update retries must be at least 1".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

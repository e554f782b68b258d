//! Error types for the voting service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

use chrono::NaiveDate;

use crate::types::CompanyId;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific voting scenarios
#[derive(Debug, thiserror::Error)]
pub enum VotingError {
    #[error("Invalid vote input: {reason}")]
    InvalidInput { reason: String },

    #[error("Identity '{identity}' has already voted on {date}")]
    DuplicateVote { identity: String, date: NaiveDate },

    #[error("Not enough companies for a comparison: have {available}, need at least 2")]
    NotEnoughCompanies { available: usize },

    #[error("Company not found: {company_id}")]
    CompanyNotFound { company_id: CompanyId },

    #[error("Conflicting update on company {company_id} after {attempts} attempts")]
    StorageConflict { company_id: CompanyId, attempts: u32 },

    #[error("Vote recorded but rating update failed: {message}")]
    PartialFailure { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

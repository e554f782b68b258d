//! Prestige Check - Daily company prestige voting service
//!
//! This crate provides daily head-to-head company comparisons with
//! ELO-style rating updates, a duplicate-proof vote ledger, and daily
//! rating history aggregation.

pub mod aggregator;
pub mod audit;
pub mod company;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod selector;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, VotingError};
pub use types::*;

// Re-export key components
pub use company::{CompanyStore, InMemoryCompanyStore};
pub use ledger::{InMemoryVoteStore, VoteRecorder, VoteStore};
pub use rating::{EloRatingEngine, RatingEngine};
pub use selector::DailySelector;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Utility functions for the voting service

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::VotingError;

/// Generate a new unique vote ID
pub fn generate_vote_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// The current voting day: today's UTC calendar date
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Yesterday's UTC calendar date, the default aggregation target
pub fn yesterday_utc() -> NaiveDate {
    today_utc() - Duration::days(1)
}

/// Parse a `YYYY-MM-DD` calendar date as exchanged over the API
pub fn parse_date(input: &str) -> crate::error::Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| {
            VotingError::InvalidInput {
                reason: format!("Invalid date '{}': expected YYYY-MM-DD", input),
            }
            .into()
        })
}

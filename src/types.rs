//! Common types used throughout the voting service

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::VotingError;

/// Unique identifier for companies
pub type CompanyId = u64;

/// Unique identifier for individual votes
pub type VoteId = Uuid;

/// Who cast a vote: an authenticated user or a stable anonymous client.
///
/// Exactly one of the two forms exists per vote; the uniqueness key for the
/// one-vote-per-day guarantee is derived from [`Identity::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    User(String),
    Anonymous(String),
}

impl Identity {
    /// Build an identity from the two optional caller-supplied ids.
    ///
    /// Fails unless exactly one of the two is present and non-empty.
    pub fn from_parts(
        user_id: Option<String>,
        anonymous_id: Option<String>,
    ) -> crate::error::Result<Self> {
        let user_id = user_id.filter(|id| !id.is_empty());
        let anonymous_id = anonymous_id.filter(|id| !id.is_empty());

        match (user_id, anonymous_id) {
            (Some(user), None) => Ok(Identity::User(user)),
            (None, Some(anon)) => Ok(Identity::Anonymous(anon)),
            (Some(_), Some(_)) => Err(VotingError::InvalidInput {
                reason: "Both user id and anonymous id supplied; expected exactly one"
                    .to_string(),
            }
            .into()),
            (None, None) => Err(VotingError::InvalidInput {
                reason: "Missing identity: supply a user id or an anonymous id".to_string(),
            }
            .into()),
        }
    }

    /// Stable uniqueness key used by the vote ledger.
    pub fn key(&self) -> String {
        match self {
            Identity::User(id) => format!("user:{}", id),
            Identity::Anonymous(id) => format!("anon:{}", id),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A company participating in daily comparisons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// Logo reference (URL or asset path), presentation-only
    pub logo: String,
    /// ELO-style prestige rating
    pub rating: i64,
    /// Cumulative vote count; only wins are counted
    pub votes: u64,
    /// Derived win percentage, 0-100
    pub win_percentage: u8,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub logo: String,
    pub rating: Option<i64>,
    pub votes: Option<u64>,
    pub win_percentage: Option<u8>,
}

/// A single recorded vote, immutable after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub company_id: CompanyId,
    pub identity: Identity,
    /// The logical voting day (UTC calendar date), not a wall-clock timestamp
    pub comparison_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// The daily comparison presented to voters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub date: NaiveDate,
    pub theme: String,
    pub companies: Vec<Company>,
}

/// A comparison scheduled ahead of time for a specific date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledComparison {
    pub date: NaiveDate,
    pub theme: String,
    pub company_ids: Vec<CompanyId>,
}

/// Per-company rating movement reported back to the voter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloChange {
    pub id: CompanyId,
    pub name: String,
    pub before: i64,
    pub after: i64,
    pub change: i64,
    pub votes: u64,
}

/// Frozen end-of-day record of a company's rating and derived stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub company_id: CompanyId,
    pub date: NaiveDate,
    pub rating: i64,
    pub votes: u64,
    pub win_percentage: u8,
    pub daily_change: i64,
}

/// Audit row returned by the daily aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUpdate {
    pub company_id: CompanyId,
    pub previous_rating: i64,
    pub current_rating: i64,
    pub daily_change: i64,
}

/// HTTP payload for vote submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    /// Authenticated user id; mutually exclusive with `anonymous_id`
    pub user_id: Option<String>,
    /// Stable anonymous client id; mutually exclusive with `user_id`
    pub anonymous_id: Option<String>,
    pub company_id: CompanyId,
    pub comparison_date: NaiveDate,
    /// Every company shown in the comparison, chosen one included
    pub company_ids: Vec<CompanyId>,
}

/// HTTP payload for triggering a daily aggregation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyUpdateRequest {
    /// Target date; yesterday UTC when omitted
    pub date: Option<NaiveDate>,
}

/// HTTP payload for applying the vote-count fix
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixVoteCountsRequest {
    /// Must be `true` for the fix to run
    #[serde(default)]
    pub fix: bool,
}

/// Reconciliation row comparing the cached vote counter with ledger truth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteCountAudit {
    pub company_id: CompanyId,
    pub name: String,
    pub stored_votes: u64,
    pub actual_votes: u64,
    /// stored - actual; non-zero means drift
    pub difference: i64,
}

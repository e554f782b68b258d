//! The vote ledger: the append-only record of votes and the recording protocol
//!
//! `store` holds the ledger itself with its atomic one-vote-per-identity-per-day
//! guarantee; `recorder` turns a validated vote into the transactional rating
//! mutation described by the ELO update protocol.

pub mod recorder;
pub mod store;

pub use recorder::VoteRecorder;
pub use store::{InMemoryVoteStore, VoteStore};

//! ELO rating computation for daily comparisons
//!
//! Pure rating math: expected scores, integer deltas, and the win-percentage
//! bookkeeping applied by the vote recorder. No I/O lives here.

pub mod engine;

pub use engine::{EloRatingEngine, RatingEngine};

//! Rating engine trait and the ELO implementation
//!
//! The engine is deterministic and idempotent given identical inputs, which is
//! what makes vote recording testable and daily reprocessing safe.

use skillratings::elo::{expected_score, EloRating};

use crate::config::rating::EloConfig;

/// Trait for computing rating deltas and derived stats
pub trait RatingEngine: Send + Sync {
    /// Expected score of the winner against one opponent, in (0, 1)
    fn expected_win_score(&self, winner_rating: i64, loser_rating: i64) -> f64;

    /// Integer rating delta transferred from one loser to the winner
    fn compute_delta(&self, winner_rating: i64, loser_rating: i64) -> i64;

    /// Winner's new win percentage after one more win
    fn winner_win_percentage(&self, old_percentage: u8, old_votes: u64) -> u8;

    /// Loser's win percentage after a loss.
    ///
    /// Losses never touch a company's own vote tally, so the denominator is
    /// unchanged and the percentage stays where it was (0 while winless).
    fn loser_win_percentage(&self, old_percentage: u8, old_votes: u64) -> u8;

    /// Rating assigned to newly registered companies
    fn initial_rating(&self) -> i64;
}

/// ELO rating engine with a fixed K-factor
#[derive(Debug, Clone)]
pub struct EloRatingEngine {
    config: EloConfig,
}

impl EloRatingEngine {
    /// Create a new engine from a validated configuration
    pub fn new(config: EloConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Default for EloRatingEngine {
    fn default() -> Self {
        Self {
            config: EloConfig::default(),
        }
    }
}

impl RatingEngine for EloRatingEngine {
    fn expected_win_score(&self, winner_rating: i64, loser_rating: i64) -> f64 {
        let winner = EloRating {
            rating: winner_rating as f64,
        };
        let loser = EloRating {
            rating: loser_rating as f64,
        };

        let (expected_win, _expected_loss) = expected_score(&winner, &loser);
        expected_win
    }

    fn compute_delta(&self, winner_rating: i64, loser_rating: i64) -> i64 {
        let expected_win = self.expected_win_score(winner_rating, loser_rating);
        (self.config.k_factor * (1.0 - expected_win)).round() as i64
    }

    fn winner_win_percentage(&self, old_percentage: u8, old_votes: u64) -> u8 {
        let numerator = old_percentage as f64 * old_votes as f64 + 100.0;
        let denominator = old_votes as f64 + 1.0;
        (numerator / denominator).round() as u8
    }

    fn loser_win_percentage(&self, old_percentage: u8, old_votes: u64) -> u8 {
        if old_votes == 0 {
            0
        } else {
            old_percentage
        }
    }

    fn initial_rating(&self) -> i64 {
        self.config.initial_rating
    }
}

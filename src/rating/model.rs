//! ELO rating model
//!
//! Pure functions for the ladder: expected score, the points a match
//! transfers, team averaging and the rating to division banding. The logistic
//! curve itself comes from the skillratings crate.

use crate::config::RatingConfig;
use serde::{Deserialize, Serialize};
use skillratings::elo::EloRating;

/// Probability that a side rated `rating_a` beats a side rated `rating_b`
///
/// `1 / (1 + 10^((rating_b - rating_a) / 400))`, always in (0, 1) for finite
/// inputs, and `expected_score(a, b) + expected_score(b, a) == 1`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    let (expected_a, _expected_b) = skillratings::elo::expected_score(
        &EloRating { rating: rating_a },
        &EloRating { rating: rating_b },
    );
    expected_a
}

/// Arithmetic mean of a team's ratings; 0.0 for an empty team
pub fn team_average(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().map(|&r| r as f64).sum::<f64>() / ratings.len() as f64
}

/// Rating arithmetic shared by match recording, leaderboards and profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingModel {
    config: RatingConfig,
}

impl Default for RatingModel {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingModel {
    /// Create a rating model from validated configuration
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Rating new participants start at and trajectories replay from
    pub fn starting_rating(&self) -> i64 {
        self.config.starting_rating
    }

    /// Points the winner gains and the loser gives up
    ///
    /// `round(K * (1 - expected_score(winner, loser)))`, rounded half away
    /// from zero and clamped to `[0, K]`. Equal ratings give `K / 2`.
    pub fn rating_delta(&self, winner_rating: f64, loser_rating: f64) -> u32 {
        let k = self.config.k_factor;
        let raw = k * (1.0 - expected_score(winner_rating, loser_rating));
        if !raw.is_finite() {
            return 0;
        }
        raw.round().clamp(0.0, k.round()) as u32
    }

    /// Delta for a whole confrontation, using each side's mean rating
    pub fn team_delta(&self, winner_ratings: &[i64], loser_ratings: &[i64]) -> u32 {
        self.rating_delta(team_average(winner_ratings), team_average(loser_ratings))
    }

    /// Division band for a rating; negative ratings sit in division 0
    pub fn division_of(&self, rating: i64) -> u64 {
        if rating < 0 {
            return 0;
        }
        (rating / self.config.division_width) as u64
    }
}

//! Rating system configuration

use serde::{Deserialize, Serialize};

/// Parameters of the ELO ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating every participant starts from, and the trajectory replay baseline
    pub starting_rating: i64,
    /// Maximum points a single match can transfer
    pub k_factor: f64,
    /// Width of one division band
    pub division_width: i64,
    /// Largest team allowed on either side of a match
    pub max_team_size: usize,
    /// Recent matches shown on a profile
    pub recent_matches_limit: usize,
    /// Matches returned by the admin history listing
    pub match_history_limit: usize,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            starting_rating: 500,
            k_factor: 32.0,
            division_width: 200,
            max_team_size: 2,
            recent_matches_limit: 20,
            match_history_limit: 50,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.k_factor.is_finite() && self.k_factor > 0.0) {
            return Err(crate::error::LadderError::ConfigurationError {
                message: "K-factor must be a positive finite number".to_string(),
            }
            .into());
        }

        if self.division_width <= 0 {
            return Err(crate::error::LadderError::ConfigurationError {
                message: "Division width must be positive".to_string(),
            }
            .into());
        }

        if self.max_team_size == 0 {
            return Err(crate::error::LadderError::ConfigurationError {
                message: "Max team size must be at least 1".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RatingConfig::default();
        assert_eq!(config.starting_rating, 500);
        assert_eq!(config.k_factor, 32.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let config = RatingConfig {
            k_factor: 0.0,
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RatingConfig {
            division_width: 0,
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RatingConfig {
            max_team_size: 0,
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

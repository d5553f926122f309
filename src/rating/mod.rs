//! Rating system for the ELO ladder
//!
//! This module provides the rating arithmetic and the storage interface
//! through which participants and match history are read and updated.

pub mod model;
pub mod storage;

// Re-export commonly used types
pub use model::{expected_score, team_average, RatingModel};
pub use storage::{
    InMemoryParticipantRepository, MatchOutcome, MatchTransaction, ParticipantRepository,
};

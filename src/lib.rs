//! Ladder Engine - ELO match resolution and rating service
//!
//! This crate records 1v1 and 2v2 match outcomes, transfers ELO rating points
//! between the sides atomically, and serves the leaderboard and per-participant
//! profile statistics derived from the stored match history.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod ladder;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LadderError, Result};
pub use types::*;

// Re-export key components
pub use ladder::{LeaderboardProjector, MatchRecorder, ProfileStatsBuilder};
pub use rating::{InMemoryParticipantRepository, ParticipantRepository, RatingModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Ladder operations: recording matches and the read-side projections

pub mod history;
pub mod leaderboard;
pub mod profile;
pub mod recorder;

pub use history::{MatchHistory, MatchHistoryEntry};
pub use leaderboard::{LeaderboardEntry, LeaderboardProjector};
pub use profile::{replay_history, ProfileStats, ProfileStatsBuilder, RecentMatch, TrajectoryPoint};
pub use recorder::{MatchRecorder, MatchResolution, RecordMatchRequest};

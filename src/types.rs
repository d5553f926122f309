//! Common types used throughout the ladder service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for participants
pub type ParticipantId = String;

/// Unique identifier for recorded matches
pub type MatchId = Uuid;

/// Side of a recorded match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// A rated participant as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub rating: i64,
    /// Counts recorded wins only; losses never touch it
    pub win_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of one resolved confrontation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub team_a: Vec<ParticipantId>,
    pub team_b: Vec<ParticipantId>,
    pub winner: Side,
    pub rating_delta: u32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Which side the participant played on, if any
    pub fn side_of(&self, participant_id: &str) -> Option<Side> {
        if self.team_a.iter().any(|id| id == participant_id) {
            Some(Side::A)
        } else if self.team_b.iter().any(|id| id == participant_id) {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Whether the participant was on the winning side
    pub fn is_winner(&self, participant_id: &str) -> bool {
        self.side_of(participant_id) == Some(self.winner)
    }

    /// Rating change applied to the participant by this match
    pub fn signed_delta_for(&self, participant_id: &str) -> i64 {
        if self.is_winner(participant_id) {
            i64::from(self.rating_delta)
        } else {
            -i64::from(self.rating_delta)
        }
    }

    /// All participant ids on both sides, team A first
    pub fn participant_ids(&self) -> impl Iterator<Item = &ParticipantId> {
        self.team_a.iter().chain(self.team_b.iter())
    }
}

/// Name-only view of a participant, used to enrich match listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub display_name: String,
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id.clone(),
            display_name: participant.display_name.clone(),
        }
    }
}

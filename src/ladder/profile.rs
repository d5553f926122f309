//! Participant profile statistics
//!
//! Replays a participant's match history in chronological order to rebuild
//! the rating trajectory, checks it against the stored rating and derives the
//! aggregate numbers shown on a profile.

use crate::error::{LadderError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{ParticipantRepository, RatingModel};
use crate::types::{MatchId, MatchRecord, ParticipantId, ParticipantSummary, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Rating after one replayed match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub match_id: MatchId,
    pub played_at: DateTime<Utc>,
    pub rating: i64,
    pub delta: i64,
}

/// Outcome of replaying a participant's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Oldest first
    pub trajectory: Vec<TrajectoryPoint>,
    pub wins: usize,
    pub losses: usize,
    pub final_rating: i64,
}

/// A match seen from one participant's side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentMatch {
    pub id: MatchId,
    pub team_a: Vec<ParticipantSummary>,
    pub team_b: Vec<ParticipantSummary>,
    pub winner: Side,
    pub rating_delta: u32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_winner: bool,
    pub signed_delta: i64,
}

/// Everything shown on a participant's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub participant: ParticipantSummary,
    pub current_rating: i64,
    pub division: u64,
    pub total_matches: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage in [0, 100]; 0 when no matches were played
    pub win_rate: f64,
    /// Current rating minus the starting rating
    pub progression: i64,
    pub trajectory: Vec<TrajectoryPoint>,
    /// Most recent first
    pub recent_matches: Vec<RecentMatch>,
}

/// Replay matches for `participant_id` starting from `starting_rating`
///
/// `matches_newest_first` is the order the store returns history in.
pub fn replay_history(
    participant_id: &str,
    starting_rating: i64,
    matches_newest_first: &[MatchRecord],
) -> Replay {
    let mut rating = starting_rating;
    let mut wins = 0;
    let mut losses = 0;
    let mut trajectory = Vec::with_capacity(matches_newest_first.len());

    for record in matches_newest_first.iter().rev() {
        let delta = record.signed_delta_for(participant_id);
        if record.is_winner(participant_id) {
            wins += 1;
        } else {
            losses += 1;
        }
        rating += delta;
        trajectory.push(TrajectoryPoint {
            match_id: record.id,
            played_at: record.created_at,
            rating,
            delta,
        });
    }

    Replay {
        trajectory,
        wins,
        losses,
        final_rating: rating,
    }
}

/// Builds profile statistics from stored history
#[derive(Clone)]
pub struct ProfileStatsBuilder {
    repository: Arc<dyn ParticipantRepository>,
    model: RatingModel,
    metrics_collector: Arc<MetricsCollector>,
}

impl ProfileStatsBuilder {
    /// Create a new profile builder
    pub fn new(repository: Arc<dyn ParticipantRepository>, model: RatingModel) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(repository, model, metrics_collector)
    }

    /// Create a new profile builder with metrics collector
    pub fn with_metrics(
        repository: Arc<dyn ParticipantRepository>,
        model: RatingModel,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            repository,
            model,
            metrics_collector,
        }
    }

    /// Build the profile for one participant
    ///
    /// Fails with `ParticipantNotFound` for an unknown id, and with
    /// `Inconsistency` when the replayed history does not end on the stored
    /// rating. Without any match the replay ends on the starting rating.
    pub async fn profile_stats(&self, participant_id: &str) -> Result<ProfileStats> {
        let participant = self
            .repository
            .find_participant(participant_id)
            .await?
            .ok_or_else(|| LadderError::ParticipantNotFound {
                ids: vec![participant_id.to_string()],
            })?;

        let matches = self.repository.find_matches_for(participant_id).await?;
        debug!(
            "Replaying {} match(es) for participant {}",
            matches.len(),
            participant_id
        );

        let replay = replay_history(participant_id, self.model.starting_rating(), &matches);
        if replay.final_rating != participant.rating {
            self.metrics_collector.record_inconsistency();
            error!(
                "Rating history mismatch for {}: stored {}, replayed {}",
                participant_id, participant.rating, replay.final_rating
            );
            return Err(LadderError::Inconsistency {
                participant_id: participant_id.to_string(),
                stored_rating: participant.rating,
                replayed_rating: replay.final_rating,
            }
            .into());
        }

        let limit = self.model.config().recent_matches_limit;
        let recent = &matches[..matches.len().min(limit)];
        let recent_matches = self.enrich(participant_id, recent).await?;

        let total_matches = replay.wins + replay.losses;
        let win_rate = if total_matches == 0 {
            0.0
        } else {
            replay.wins as f64 / total_matches as f64 * 100.0
        };

        Ok(ProfileStats {
            division: self.model.division_of(participant.rating),
            current_rating: participant.rating,
            progression: participant.rating - self.model.starting_rating(),
            participant: ParticipantSummary::from(&participant),
            total_matches,
            wins: replay.wins,
            losses: replay.losses,
            win_rate,
            trajectory: replay.trajectory,
            recent_matches,
        })
    }

    async fn enrich(
        &self,
        participant_id: &str,
        records: &[MatchRecord],
    ) -> Result<Vec<RecentMatch>> {
        let names = summaries_for(self.repository.as_ref(), records).await?;

        Ok(records
            .iter()
            .map(|record| RecentMatch {
                id: record.id,
                team_a: lookup_team(&names, &record.team_a),
                team_b: lookup_team(&names, &record.team_b),
                winner: record.winner,
                rating_delta: record.rating_delta,
                message: record.message.clone(),
                created_at: record.created_at,
                is_winner: record.is_winner(participant_id),
                signed_delta: record.signed_delta_for(participant_id),
            })
            .collect())
    }
}

/// Display names for everyone appearing in `records`
pub(crate) async fn summaries_for(
    repository: &dyn ParticipantRepository,
    records: &[MatchRecord],
) -> Result<HashMap<ParticipantId, ParticipantSummary>> {
    let mut ids: Vec<ParticipantId> = records
        .iter()
        .flat_map(|r| r.participant_ids().cloned())
        .collect();
    ids.sort();
    ids.dedup();

    Ok(repository
        .find_many(&ids)
        .await?
        .iter()
        .map(|p| (p.id.clone(), ParticipantSummary::from(p)))
        .collect())
}

/// Map a team's ids to summaries; a participant removed from the store keeps its id as name
pub(crate) fn lookup_team(
    names: &HashMap<ParticipantId, ParticipantSummary>,
    team: &[ParticipantId],
) -> Vec<ParticipantSummary> {
    team.iter()
        .map(|id| {
            names.get(id).cloned().unwrap_or_else(|| ParticipantSummary {
                id: id.clone(),
                display_name: id.clone(),
            })
        })
        .collect()
}

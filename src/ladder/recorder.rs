//! Match recording
//!
//! Resolves one reported confrontation: validates the teams, reads current
//! ratings inside a store transaction, computes the delta from the team
//! averages and commits every rating change together with the match record.

use crate::error::{error_kind, LadderError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{MatchOutcome, ParticipantRepository, RatingModel};
use crate::types::{MatchId, MatchRecord, Participant, ParticipantId, Side};
use crate::utils::{current_timestamp, duplicate_ids, generate_match_id};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Request to record a match outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMatchRequest {
    pub winner_ids: Vec<ParticipantId>,
    pub loser_ids: Vec<ParticipantId>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RecordMatchRequest {
    /// Normalize the request at the boundary
    ///
    /// Ids are trimmed and must not be blank; the message is trimmed and an
    /// empty message counts as absent.
    pub fn validate(self) -> Result<Self> {
        let normalize = |ids: Vec<ParticipantId>| -> Result<Vec<ParticipantId>> {
            ids.into_iter()
                .map(|id| {
                    let trimmed = id.trim();
                    if trimmed.is_empty() {
                        Err(LadderError::InvalidRequest {
                            reason: "participant ids must not be blank".to_string(),
                        }
                        .into())
                    } else {
                        Ok(trimmed.to_string())
                    }
                })
                .collect()
        };

        Ok(Self {
            winner_ids: normalize(self.winner_ids)?,
            loser_ids: normalize(self.loser_ids)?,
            message: self
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        })
    }
}

/// Result of a successfully recorded match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResolution {
    pub match_id: MatchId,
    pub delta: u32,
    pub updated_count: usize,
}

/// Records match outcomes against the participant store
#[derive(Clone)]
pub struct MatchRecorder {
    repository: Arc<dyn ParticipantRepository>,
    model: RatingModel,
    metrics_collector: Arc<MetricsCollector>,
}

impl MatchRecorder {
    /// Create a new match recorder
    pub fn new(repository: Arc<dyn ParticipantRepository>, model: RatingModel) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(repository, model, metrics_collector)
    }

    /// Create a new match recorder with metrics collector
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

    /// Check team composition before touching the store
    pub fn validate_composition(
        &self,
        winner_ids: &[ParticipantId],
        loser_ids: &[ParticipantId],
    ) -> Result<()> {
        if winner_ids.is_empty() || loser_ids.is_empty() {
            return Err(LadderError::InvalidComposition {
                reason: "both sides need at least one participant".to_string(),
            }
            .into());
        }

        let max = self.model.config().max_team_size;
        if winner_ids.len() > max || loser_ids.len() > max {
            return Err(LadderError::InvalidComposition {
                reason: format!("teams are limited to {} participant(s)", max),
            }
            .into());
        }

        let duplicates = duplicate_ids(winner_ids.iter().chain(loser_ids.iter()));
        if !duplicates.is_empty() {
            return Err(LadderError::InvalidComposition {
                reason: format!("participant(s) listed twice: {}", duplicates.join(", ")),
            }
            .into());
        }

        Ok(())
    }

    /// Validate and record a boundary request
    pub async fn record(&self, request: RecordMatchRequest) -> Result<MatchResolution> {
        let request = match request.validate() {
            Ok(request) => request,
            Err(e) => {
                self.metrics_collector.record_match_rejected(error_kind(&e));
                return Err(e);
            }
        };
        self.record_match(&request.winner_ids, &request.loser_ids, request.message)
            .await
    }

    /// Record a match won by `winner_ids` against `loser_ids`
    ///
    /// The winning side is stored as team A. Either every rating change and
    /// the match record are committed, or nothing is.
    pub async fn record_match(
        &self,
        winner_ids: &[ParticipantId],
        loser_ids: &[ParticipantId],
        message: Option<String>,
    ) -> Result<MatchResolution> {
        let timer = self.metrics_collector.start_timer();

        match self.resolve(winner_ids, loser_ids, message).await {
            Ok(resolution) => {
                self.metrics_collector.record_match_recorded(resolution.delta, timer.stop());
                Ok(resolution)
            }
            Err(e) => {
                warn!(
                    "Match rejected - winners: {:?}, losers: {:?}, error: {}",
                    winner_ids, loser_ids, e
                );
                self.metrics_collector.record_match_rejected(error_kind(&e));
                Err(e)
            }
        }
    }

    async fn resolve(
        &self,
        winner_ids: &[ParticipantId],
        loser_ids: &[ParticipantId],
        message: Option<String>,
    ) -> Result<MatchResolution> {
        let start_time = Instant::now();
        self.validate_composition(winner_ids, loser_ids)?;

        if winner_ids.len() != loser_ids.len() {
            warn!(
                "Recording uneven match ({} vs {}); team means are compared as-is",
                winner_ids.len(),
                loser_ids.len()
            );
        }

        let all_ids: Vec<ParticipantId> =
            winner_ids.iter().chain(loser_ids.iter()).cloned().collect();

        // Dropping `tx` on any early return rolls the transaction back
        let mut tx = self.repository.begin().await?;
        let found = tx.find_many(&all_ids).await?;
        let by_id: HashMap<&str, &Participant> = found.iter().map(|p| (p.id.as_str(), p)).collect();

        let missing: Vec<String> = all_ids
            .iter()
            .filter(|id| !by_id.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(LadderError::ParticipantNotFound { ids: missing }.into());
        }

        let ratings_of = |ids: &[ParticipantId]| -> Vec<i64> {
            ids.iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|p| p.rating))
                .collect()
        };
        let winner_ratings = ratings_of(winner_ids);
        let loser_ratings = ratings_of(loser_ids);
        let delta = self.model.team_delta(&winner_ratings, &loser_ratings);
        debug!(
            "Computed delta {} from winner ratings {:?} and loser ratings {:?}",
            delta, winner_ratings, loser_ratings
        );

        let record = MatchRecord {
            id: generate_match_id(),
            team_a: winner_ids.to_vec(),
            team_b: loser_ids.to_vec(),
            winner: Side::A,
            rating_delta: delta,
            message,
            created_at: current_timestamp(),
        };
        let match_id = record.id;

        tx.apply_match_outcome(MatchOutcome {
            winner_ids: winner_ids.to_vec(),
            loser_ids: loser_ids.to_vec(),
            delta,
            record,
        })
        .await?;
        tx.commit().await?;

        info!(
            "Match {} recorded - winners: {:?}, losers: {:?}, delta: {}, time: {:.2}ms",
            match_id,
            winner_ids,
            loser_ids,
            delta,
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        Ok(MatchResolution {
            match_id,
            delta,
            updated_count: all_ids.len(),
        })
    }
}

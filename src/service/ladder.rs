//! Role-checked entry point to the ladder operations
//!
//! Transports resolve the caller and hand it here; this layer decides who may
//! do what and times each operation.

use crate::auth::{require_admin, Principal};
use crate::error::Result;
use crate::ladder::{
    LeaderboardEntry, LeaderboardProjector, MatchHistory, MatchHistoryEntry, MatchRecorder,
    MatchResolution, ProfileStats, ProfileStatsBuilder, RecordMatchRequest,
};
use crate::metrics::MetricsCollector;
use crate::rating::{ParticipantRepository, RatingModel};
use std::sync::Arc;
use tracing::{debug, info};

/// Ladder operations behind role checks
#[derive(Clone)]
pub struct LadderService {
    recorder: MatchRecorder,
    leaderboard: LeaderboardProjector,
    profiles: ProfileStatsBuilder,
    history: MatchHistory,
    metrics_collector: Arc<MetricsCollector>,
}

impl LadderService {
    pub fn new(
        repository: Arc<dyn ParticipantRepository>,
        model: RatingModel,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            recorder: MatchRecorder::with_metrics(
                repository.clone(),
                model.clone(),
                metrics_collector.clone(),
            ),
            leaderboard: LeaderboardProjector::new(repository.clone(), model.clone()),
            profiles: ProfileStatsBuilder::with_metrics(
                repository.clone(),
                model.clone(),
                metrics_collector.clone(),
            ),
            history: MatchHistory::new(repository, model),
            metrics_collector,
        }
    }

    /// Record a match; admin only
    pub async fn record_match(
        &self,
        principal: Option<&Principal>,
        request: RecordMatchRequest,
    ) -> Result<MatchResolution> {
        let admin = require_admin(principal)?;
        info!(
            "Match report from {} - winners: {:?}, losers: {:?}",
            admin.id, request.winner_ids, request.loser_ids
        );
        self.recorder.record(request).await
    }

    /// Ranked participants; open to everyone
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let timer = self.metrics_collector.start_timer();
        let board = self.leaderboard.leaderboard().await?;
        self.metrics_collector.record_operation("leaderboard", timer.stop());
        Ok(board)
    }

    /// Profile statistics for one participant; open to everyone
    pub async fn profile(&self, participant_id: &str) -> Result<ProfileStats> {
        let timer = self.metrics_collector.start_timer();
        let stats = self.profiles.profile_stats(participant_id).await?;
        self.metrics_collector.record_operation("profile", timer.stop());
        Ok(stats)
    }

    /// Latest matches across the ladder; admin only
    pub async fn match_history(
        &self,
        principal: Option<&Principal>,
        limit: Option<usize>,
    ) -> Result<Vec<MatchHistoryEntry>> {
        let admin = require_admin(principal)?;
        debug!("Match history requested by {}", admin.id);

        let timer = self.metrics_collector.start_timer();
        let entries = self.history.recent(limit).await?;
        self.metrics_collector.record_operation("match_history", timer.stop());
        Ok(entries)
    }
}

//! Ladder-wide match history for administrators

use crate::error::Result;
use crate::ladder::profile::{lookup_team, summaries_for};
use crate::rating::{ParticipantRepository, RatingModel};
use crate::types::{MatchId, ParticipantSummary, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A stored match with display names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub id: MatchId,
    pub team_a: Vec<ParticipantSummary>,
    pub team_b: Vec<ParticipantSummary>,
    pub winner: Side,
    pub rating_delta: u32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MatchHistory {
    repository: Arc<dyn ParticipantRepository>,
    model: RatingModel,
}

impl MatchHistory {
    pub fn new(repository: Arc<dyn ParticipantRepository>, model: RatingModel) -> Self {
        Self { repository, model }
    }

    /// Latest matches, most recent first
    ///
    /// `limit` is capped by the configured history limit; `None` uses it as is.
    pub async fn recent(&self, limit: Option<usize>) -> Result<Vec<MatchHistoryEntry>> {
        let max = self.model.config().match_history_limit;
        let limit = limit.map_or(max, |l| l.min(max));

        let records = self.repository.recent_matches(limit).await?;
        let names = summaries_for(self.repository.as_ref(), &records).await?;

        Ok(records
            .into_iter()
            .map(|record| MatchHistoryEntry {
                team_a: lookup_team(&names, &record.team_a),
                team_b: lookup_team(&names, &record.team_b),
                id: record.id,
                winner: record.winner,
                rating_delta: record.rating_delta,
                message: record.message,
                created_at: record.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingConfig;
    use crate::ladder::MatchRecorder;
    use crate::rating::InMemoryParticipantRepository;

    async fn setup(history_limit: usize) -> (MatchRecorder, MatchHistory) {
        let repo = Arc::new(InMemoryParticipantRepository::default());
        for (id, name) in [("ann", "Ann"), ("bob", "Bob"), ("cid", "Cid")] {
            repo.upsert_participant(id, name).await.unwrap();
        }
        let model = RatingModel::new(RatingConfig {
            match_history_limit: history_limit,
            ..Default::default()
        })
        .unwrap();
        (
            MatchRecorder::new(repo.clone(), model.clone()),
            MatchHistory::new(repo, model),
        )
    }

    #[tokio::test]
    async fn test_history_is_enriched_and_newest_first() {
        let (recorder, history) = setup(50).await;
        recorder
            .record_match(&["ann".to_string()], &["bob".to_string()], None)
            .await
            .unwrap();
        recorder
            .record_match(
                &["cid".to_string()],
                &["ann".to_string()],
                Some("upset".to_string()),
            )
            .await
            .unwrap();

        let entries = history.recent(None).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].team_a[0].display_name, "Cid");
        assert_eq!(entries[0].team_b[0].display_name, "Ann");
        assert_eq!(entries[0].message.as_deref(), Some("upset"));
        assert_eq!(entries[1].rating_delta, 16);
    }

    #[tokio::test]
    async fn test_limit_is_capped() {
        let (recorder, history) = setup(3).await;
        for _ in 0..5 {
            recorder
                .record_match(&["ann".to_string()], &["bob".to_string()], None)
                .await
                .unwrap();
        }

        assert_eq!(history.recent(None).await.unwrap().len(), 3);
        assert_eq!(history.recent(Some(2)).await.unwrap().len(), 2);
        assert_eq!(history.recent(Some(100)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let (_recorder, history) = setup(50).await;
        assert!(history.recent(None).await.unwrap().is_empty());
    }
}

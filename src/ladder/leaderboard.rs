//! Leaderboard projection
//!
//! Ranks every participant by rating and annotates each with its division.

use crate::error::Result;
use crate::rating::{ParticipantRepository, RatingModel};
use crate::types::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: ParticipantId,
    pub display_name: String,
    pub rating: i64,
    pub division: u64,
    /// 1-based position
    pub rank: usize,
    pub win_count: u64,
}

/// Builds the ranked participant list
#[derive(Clone)]
pub struct LeaderboardProjector {
    repository: Arc<dyn ParticipantRepository>,
    model: RatingModel,
}

impl LeaderboardProjector {
    pub fn new(repository: Arc<dyn ParticipantRepository>, model: RatingModel) -> Self {
        Self { repository, model }
    }

    /// Fetch all participants and rank them
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let participants = self.repository.list_all().await?;
        debug!("Projecting leaderboard over {} participants", participants.len());
        Ok(self.project(participants))
    }

    /// Rank participants: rating descending, then display name ascending
    ///
    /// Names compare by byte order; the id breaks any remaining tie so the
    /// output never depends on store iteration order.
    pub fn project(&self, mut participants: Vec<Participant>) -> Vec<LeaderboardEntry> {
        participants.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.id.cmp(&b.id))
        });

        participants
            .into_iter()
            .enumerate()
            .map(|(index, p)| LeaderboardEntry {
                division: self.model.division_of(p.rating),
                rank: index + 1,
                id: p.id,
                display_name: p.display_name,
                rating: p.rating,
                win_count: p.win_count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::InMemoryParticipantRepository;
    use crate::utils::current_timestamp;

    fn participant(id: &str, name: &str, rating: i64) -> Participant {
        Participant {
            id: id.to_string(),
            display_name: name.to_string(),
            rating,
            win_count: 0,
            created_at: current_timestamp(),
        }
    }

    fn projector() -> (LeaderboardProjector, Arc<InMemoryParticipantRepository>) {
        let repo = Arc::new(InMemoryParticipantRepository::default());
        (
            LeaderboardProjector::new(repo.clone(), RatingModel::default()),
            repo,
        )
    }

    #[tokio::test]
    async fn test_ties_broken_by_name() {
        let (projector, repo) = projector();
        repo.preset(
            vec![
                participant("1", "Bob", 700),
                participant("2", "Ann", 500),
                participant("3", "Alice", 700),
            ],
            vec![],
        )
        .await;

        let board = projector.leaderboard().await.unwrap();
        let order: Vec<_> = board
            .iter()
            .map(|e| (e.display_name.as_str(), e.rating, e.rank))
            .collect();
        assert_eq!(
            order,
            vec![("Alice", 700, 1), ("Bob", 700, 2), ("Ann", 500, 3)]
        );
    }

    #[tokio::test]
    async fn test_divisions_annotated() {
        let (projector, repo) = projector();
        repo.preset(
            vec![
                participant("1", "Low", -40),
                participant("2", "Mid", 399),
                participant("3", "High", 1000),
            ],
            vec![],
        )
        .await;

        let board = projector.leaderboard().await.unwrap();
        let divisions: Vec<_> = board.iter().map(|e| e.division).collect();
        assert_eq!(divisions, vec![5, 1, 0]);
    }

    #[tokio::test]
    async fn test_empty_store_gives_empty_board() {
        let (projector, _repo) = projector();
        assert!(projector.leaderboard().await.unwrap().is_empty());
    }

    #[test]
    fn test_name_ordering_is_case_sensitive() {
        let (projector, _repo) = projector();
        let board = projector.project(vec![
            participant("1", "alice", 500),
            participant("2", "Bob", 500),
        ]);
        // Uppercase sorts before lowercase in byte order
        assert_eq!(board[0].display_name, "Bob");
    }
}

//! Participant storage interface and implementations
//!
//! This module defines the interface for reading participants and match
//! history and for applying a match outcome inside one transaction, with an
//! in-memory implementation that serializes writers behind a single lock.

use crate::error::{LadderError, Result};
use crate::types::{MatchRecord, Participant, ParticipantId};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, warn};

/// Everything a store needs to apply one resolved match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner_ids: Vec<ParticipantId>,
    pub loser_ids: Vec<ParticipantId>,
    pub delta: u32,
    pub record: MatchRecord,
}

/// Trait for participant and match history storage
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Get a single participant
    async fn find_participant(&self, id: &str) -> Result<Option<Participant>>;

    /// Get the participants that exist among `ids`, in no particular order
    async fn find_many(&self, ids: &[ParticipantId]) -> Result<Vec<Participant>>;

    /// Get every participant
    async fn list_all(&self) -> Result<Vec<Participant>>;

    /// Get a participant's matches, most recent first
    async fn find_matches_for(&self, participant_id: &str) -> Result<Vec<MatchRecord>>;

    /// Get the latest matches across the ladder, most recent first
    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>>;

    /// Create a participant at the starting rating, or refresh its display name
    async fn upsert_participant(&self, id: &str, display_name: &str) -> Result<Participant>;

    /// Get total number of participants
    async fn participant_count(&self) -> Result<usize>;

    /// Open a write transaction
    ///
    /// Participants read through the transaction stay locked against other
    /// writers until it commits or is dropped. Dropping without commit rolls
    /// back every staged change.
    async fn begin(&self) -> Result<Box<dyn MatchTransaction>>;
}

/// A write transaction over the participant store
#[async_trait]
pub trait MatchTransaction: Send {
    /// Read participants under the transaction's lock
    async fn find_many(&mut self, ids: &[ParticipantId]) -> Result<Vec<Participant>>;

    /// Stage rating changes for both sides plus the history insert
    async fn apply_match_outcome(&mut self, outcome: MatchOutcome) -> Result<()>;

    /// Make staged changes visible; the transaction is finished afterwards
    async fn commit(&mut self) -> Result<()>;
}

/// Store contents guarded by one lock
#[derive(Debug, Default)]
struct StoreState {
    participants: HashMap<ParticipantId, Participant>,
    /// Append-only, oldest first
    matches: Vec<MatchRecord>,
}

/// In-memory participant storage implementation
#[derive(Debug)]
pub struct InMemoryParticipantRepository {
    state: Arc<RwLock<StoreState>>,
    starting_rating: i64,
    lock_timeout: Duration,
    fail_next_write: AtomicBool,
}

impl InMemoryParticipantRepository {
    /// Create a new in-memory store
    pub fn new(starting_rating: i64, lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            starting_rating,
            lock_timeout,
            fail_next_write: AtomicBool::new(false),
        }
    }

    /// Replace the store contents (fixtures, imports)
    ///
    /// `matches` must be given oldest first.
    pub async fn preset(&self, participants: Vec<Participant>, matches: Vec<MatchRecord>) {
        let mut state = self.state.write().await;
        state.participants = participants
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        state.matches = matches;
    }

    /// Make the next transaction fail right before its history insert
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Total number of stored matches
    pub async fn match_count(&self) -> usize {
        self.state.read().await.matches.len()
    }
}

impl Default for InMemoryParticipantRepository {
    fn default() -> Self {
        Self::new(500, Duration::from_secs(5))
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    async fn find_participant(&self, id: &str) -> Result<Option<Participant>> {
        let state = self.state.read().await;
        Ok(state.participants.get(id).cloned())
    }

    async fn find_many(&self, ids: &[ParticipantId]) -> Result<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.participants.get(id).cloned())
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state.participants.values().cloned().collect())
    }

    async fn find_matches_for(&self, participant_id: &str) -> Result<Vec<MatchRecord>> {
        let state = self.state.read().await;
        Ok(state
            .matches
            .iter()
            .rev()
            .filter(|record| record.side_of(participant_id).is_some())
            .cloned()
            .collect())
    }

    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>> {
        let state = self.state.read().await;
        Ok(state.matches.iter().rev().take(limit).cloned().collect())
    }

    async fn upsert_participant(&self, id: &str, display_name: &str) -> Result<Participant> {
        let mut state = self.state.write().await;
        let participant = state
            .participants
            .entry(id.to_string())
            .and_modify(|p| p.display_name = display_name.to_string())
            .or_insert_with(|| Participant {
                id: id.to_string(),
                display_name: display_name.to_string(),
                rating: self.starting_rating,
                win_count: 0,
                created_at: current_timestamp(),
            });
        Ok(participant.clone())
    }

    async fn participant_count(&self) -> Result<usize> {
        Ok(self.state.read().await.participants.len())
    }

    async fn begin(&self) -> Result<Box<dyn MatchTransaction>> {
        let guard = tokio::time::timeout(self.lock_timeout, self.state.clone().write_owned())
            .await
            .map_err(|_| {
                warn!(
                    "Timed out after {:?} waiting for the participant store write lock",
                    self.lock_timeout
                );
                LadderError::ConcurrencyConflict {
                    message: format!(
                        "store write lock not acquired within {}ms",
                        self.lock_timeout.as_millis()
                    ),
                }
            })?;

        Ok(Box::new(InMemoryTransaction {
            guard,
            staged_participants: HashMap::new(),
            staged_matches: Vec::new(),
            fail_before_insert: self.fail_next_write.swap(false, Ordering::SeqCst),
            finished: false,
        }))
    }
}

/// Write transaction holding the store lock for its whole lifetime
struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<StoreState>,
    staged_participants: HashMap<ParticipantId, Participant>,
    staged_matches: Vec<MatchRecord>,
    fail_before_insert: bool,
    finished: bool,
}

impl InMemoryTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(LadderError::StorageFailure {
                message: "transaction already committed".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Staged copy of a participant, pulled from the store on first touch
    fn staged(&mut self, id: &str) -> Option<&mut Participant> {
        if !self.staged_participants.contains_key(id) {
            let current = self.guard.participants.get(id)?.clone();
            self.staged_participants.insert(id.to_string(), current);
        }
        self.staged_participants.get_mut(id)
    }
}

#[async_trait]
impl MatchTransaction for InMemoryTransaction {
    async fn find_many(&mut self, ids: &[ParticipantId]) -> Result<Vec<Participant>> {
        self.ensure_open()?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.staged_participants
                    .get(id)
                    .or_else(|| self.guard.participants.get(id))
                    .cloned()
            })
            .collect())
    }

    async fn apply_match_outcome(&mut self, outcome: MatchOutcome) -> Result<()> {
        self.ensure_open()?;
        let delta = i64::from(outcome.delta);

        for id in &outcome.winner_ids {
            let participant = self
                .staged(id)
                .ok_or_else(|| LadderError::ParticipantNotFound {
                    ids: vec![id.clone()],
                })?;
            participant.rating += delta;
            participant.win_count += 1;
        }

        for id in &outcome.loser_ids {
            let participant = self
                .staged(id)
                .ok_or_else(|| LadderError::ParticipantNotFound {
                    ids: vec![id.clone()],
                })?;
            participant.rating -= delta;
        }

        if self.fail_before_insert {
            return Err(LadderError::StorageFailure {
                message: "match history insert failed".to_string(),
            }
            .into());
        }

        self.staged_matches.push(outcome.record);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;

        let participants: Vec<_> = self.staged_participants.drain().collect();
        let matches: Vec<_> = self.staged_matches.drain(..).collect();
        debug!(
            "Committing {} participant update(s) and {} match record(s)",
            participants.len(),
            matches.len()
        );

        for (id, participant) in participants {
            self.guard.participants.insert(id, participant);
        }
        self.guard.matches.extend(matches);
        self.finished = true;
        Ok(())
    }
}

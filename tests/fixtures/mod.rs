//! Test fixtures shared by the integration tests

#![allow(dead_code)]

use ladder_engine::auth::Role;
use ladder_engine::config::{AppConfig, AuthSettings, StaticToken};
use ladder_engine::rating::{InMemoryParticipantRepository, ParticipantRepository};
use ladder_engine::types::{Participant, ParticipantId};
use ladder_engine::utils::current_timestamp;
use std::sync::Arc;

pub const ADMIN_TOKEN: &str = "referee-token";
pub const MEMBER_TOKEN: &str = "player-token";

/// Owned id list from string literals
pub fn ids(raw: &[&str]) -> Vec<ParticipantId> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// A participant with explicit rating and win count
pub fn participant(id: &str, display_name: &str, rating: i64, win_count: u64) -> Participant {
    Participant {
        id: id.to_string(),
        display_name: display_name.to_string(),
        rating,
        win_count,
        created_at: current_timestamp(),
    }
}

/// Store holding the given `(id, display_name)` pairs at the starting rating
pub async fn seeded_repository(people: &[(&str, &str)]) -> Arc<InMemoryParticipantRepository> {
    let repo = Arc::new(InMemoryParticipantRepository::default());
    for (id, name) in people {
        repo.upsert_participant(id, name)
            .await
            .expect("Failed to seed participant");
    }
    repo
}

/// Four participants for singles and doubles scenarios
pub async fn four_player_repository() -> Arc<InMemoryParticipantRepository> {
    seeded_repository(&[
        ("ann", "Ann"),
        ("bob", "Bob"),
        ("cid", "Cid"),
        ("dee", "Dee"),
    ])
    .await
}

/// Configuration with one admin and one member token
pub fn config_with_tokens() -> AppConfig {
    AppConfig {
        auth: AuthSettings {
            tokens: vec![
                StaticToken {
                    token: ADMIN_TOKEN.to_string(),
                    principal_id: "referee".to_string(),
                    role: Role::Admin,
                },
                StaticToken {
                    token: MEMBER_TOKEN.to_string(),
                    principal_id: "ann".to_string(),
                    role: Role::Member,
                },
            ],
            ..AuthSettings::default()
        },
        ..AppConfig::default()
    }
}

/// Sum of every stored rating
pub async fn total_rating(repo: &dyn ParticipantRepository) -> i64 {
    repo.list_all()
        .await
        .expect("Failed to list participants")
        .iter()
        .map(|p| p.rating)
        .sum()
}

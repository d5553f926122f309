//! Integration tests for the ladder service
//!
//! These tests validate the system working together:
//! - Match recording feeding the leaderboard and profiles
//! - Atomicity when the store fails mid-resolution
//! - Concurrent match resolution on overlapping participants
//! - The HTTP surface with token authentication

mod fixtures;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use fixtures::{
    config_with_tokens, four_player_repository, ids, participant, seeded_repository,
    total_rating, ADMIN_TOKEN, MEMBER_TOKEN,
};
use futures::future::join_all;
use ladder_engine::error::{error_kind, LadderError};
use ladder_engine::ladder::{LeaderboardProjector, MatchRecorder, ProfileStatsBuilder};
use ladder_engine::metrics::{HealthServer, HealthServerConfig};
use ladder_engine::rating::{InMemoryParticipantRepository, ParticipantRepository, RatingModel};
use ladder_engine::service::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for oneshot

struct Ladder {
    repo: Arc<InMemoryParticipantRepository>,
    recorder: MatchRecorder,
    leaderboard: LeaderboardProjector,
    profiles: ProfileStatsBuilder,
}

fn ladder_over(repo: Arc<InMemoryParticipantRepository>) -> Ladder {
    let model = RatingModel::default();
    Ladder {
        recorder: MatchRecorder::new(repo.clone(), model.clone()),
        leaderboard: LeaderboardProjector::new(repo.clone(), model.clone()),
        profiles: ProfileStatsBuilder::new(repo.clone(), model),
        repo,
    }
}

#[tokio::test]
async fn test_singles_flow_feeds_leaderboard_and_profiles() {
    let ladder = ladder_over(four_player_repository().await);

    let first = ladder
        .recorder
        .record_match(&ids(&["ann"]), &ids(&["bob"]), None)
        .await
        .unwrap();
    assert_eq!(first.delta, 16);

    // bob (484) upsets cid (500): the underdog gains more than half of K
    let upset = ladder
        .recorder
        .record_match(&ids(&["bob"]), &ids(&["cid"]), Some("upset".to_string()))
        .await
        .unwrap();
    assert_eq!(upset.delta, 17);

    let board = ladder.leaderboard.leaderboard().await.unwrap();
    let order: Vec<_> = board.iter().map(|e| (e.id.as_str(), e.rating)).collect();
    assert_eq!(
        order,
        vec![("ann", 516), ("bob", 501), ("dee", 500), ("cid", 483)]
    );
    assert!(board.iter().enumerate().all(|(i, e)| e.rank == i + 1));

    let bob = ladder.profiles.profile_stats("bob").await.unwrap();
    assert_eq!((bob.wins, bob.losses), (1, 1));
    assert_eq!(bob.win_rate, 50.0);
    assert_eq!(bob.progression, 1);
    let path: Vec<_> = bob.trajectory.iter().map(|p| (p.rating, p.delta)).collect();
    assert_eq!(path, vec![(484, -16), (501, 17)]);
    assert_eq!(bob.recent_matches[0].message.as_deref(), Some("upset"));
    assert!(bob.recent_matches[0].is_winner);
}

#[tokio::test]
async fn test_doubles_delta_uses_team_means() {
    let repo = seeded_repository(&[]).await;
    repo.preset(
        vec![
            participant("a1", "A1", 600, 0),
            participant("a2", "A2", 400, 0),
            participant("b1", "B1", 520, 0),
            participant("b2", "B2", 480, 0),
        ],
        vec![],
    )
    .await;
    let ladder = ladder_over(repo);

    let resolution = ladder
        .recorder
        .record_match(&ids(&["a1", "a2"]), &ids(&["b1", "b2"]), None)
        .await
        .unwrap();
    // Both means are 500
    assert_eq!(resolution.delta, 16);
    assert_eq!(resolution.updated_count, 4);

    let mut ratings = Vec::new();
    for id in ["a1", "a2", "b1", "b2"] {
        let participant = ladder.repo.find_participant(id).await.unwrap().unwrap();
        ratings.push(participant.rating);
    }
    assert_eq!(ratings, vec![616, 416, 504, 464]);

    // Seeded ratings with a single recorded match do not replay from 500
    let err = ladder.profiles.profile_stats("a1").await.unwrap_err();
    assert_eq!(error_kind(&err), "inconsistency");
}

#[tokio::test]
async fn test_failed_write_leaves_history_consistent() {
    let ladder = ladder_over(four_player_repository().await);
    ladder
        .recorder
        .record_match(&ids(&["ann"]), &ids(&["bob"]), None)
        .await
        .unwrap();

    ladder.repo.fail_next_write();
    let err = ladder
        .recorder
        .record_match(&ids(&["ann", "cid"]), &ids(&["bob", "dee"]), None)
        .await
        .unwrap_err();
    assert_eq!(error_kind(&err), "storage_failure");

    for id in ["ann", "bob", "cid", "dee"] {
        let stats = ladder.profiles.profile_stats(id).await.unwrap();
        assert!(stats.total_matches <= 1);
    }
    assert_eq!(ladder.repo.match_count().await, 1);
    assert_eq!(total_rating(ladder.repo.as_ref()).await, 2000);
}

#[tokio::test]
async fn test_concurrent_matches_apply_sequentially() {
    let ladder = ladder_over(four_player_repository().await);
    let recorder = Arc::new(ladder.recorder.clone());

    let pairings = [
        (["ann"], ["bob"]),
        (["bob"], ["cid"]),
        (["cid"], ["ann"]),
        (["ann"], ["dee"]),
        (["dee"], ["bob"]),
        (["ann"], ["cid"]),
    ];

    let handles: Vec<_> = (0..30)
        .map(|i| {
            let recorder = recorder.clone();
            let (winners, losers) = pairings[i % pairings.len()];
            tokio::spawn(async move {
                recorder
                    .record_match(&ids(&winners), &ids(&losers), None)
                    .await
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.expect("task panicked").expect("match rejected");
    }

    assert_eq!(ladder.repo.match_count().await, 30);
    // Singles transfers are zero-sum
    assert_eq!(total_rating(ladder.repo.as_ref()).await, 2000);

    // Every stored rating is exactly the replay of its history
    let mut played = 0;
    for id in ["ann", "bob", "cid", "dee"] {
        let stats = ladder.profiles.profile_stats(id).await.unwrap();
        played += stats.total_matches;
        let stored = ladder.repo.find_participant(id).await.unwrap().unwrap();
        assert_eq!(stats.wins as u64, stored.win_count);
    }
    assert_eq!(played, 60);
}

#[tokio::test]
async fn test_writer_waiting_too_long_gets_conflict() {
    let repo = Arc::new(InMemoryParticipantRepository::new(
        500,
        Duration::from_millis(20),
    ));
    repo.upsert_participant("ann", "Ann").await.unwrap();
    repo.upsert_participant("bob", "Bob").await.unwrap();
    let recorder = MatchRecorder::new(repo.clone(), RatingModel::default());

    let held = repo.begin().await.unwrap();
    let err = recorder
        .record_match(&ids(&["ann"]), &ids(&["bob"]), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LadderError>(),
        Some(LadderError::ConcurrencyConflict { .. })
    ));
    drop(held);

    recorder
        .record_match(&ids(&["ann"]), &ids(&["bob"]), None)
        .await
        .unwrap();
}

async fn http_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config_with_tokens()).await.unwrap());
    state.start().await.unwrap();
    for (id, name) in [("ann", "Ann"), ("bob", "Bob"), ("cid", "Cid"), ("dee", "Dee")] {
        state
            .repository()
            .upsert_participant(id, name)
            .await
            .unwrap();
    }

    let server = HealthServer::new(HealthServerConfig::default(), state.metrics_collector())
        .with_app_state(state.clone());
    (server.create_router(), state)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_match(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/matches")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_http_doubles_round_trip() {
    let (app, state) = http_app().await;

    let (status, body) = send(
        &app,
        post_match(
            ADMIN_TOKEN,
            json!({"winner_ids": ["ann", "bob"], "loser_ids": ["cid", "dee"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["delta"], 16);
    assert_eq!(body["updated_count"], 4);

    let (status, board) = send(&app, get("/leaderboard")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = board
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["display_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Ann", "Bob", "Cid", "Dee"]);

    let (status, profile) = send(&app, get("/profiles/dee")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["current_rating"], 484);
    assert_eq!(profile["recent_matches"][0]["team_a"][1]["display_name"], "Bob");

    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        state
            .metrics_collector()
            .matches()
            .matches_recorded_total
            .get(),
        1
    );
    state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_http_rejections() {
    let (app, state) = http_app().await;

    let (status, body) = send(
        &app,
        post_match(MEMBER_TOKEN, json!({"winner_ids": ["ann"], "loser_ids": ["bob"]})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(
        &app,
        post_match("forged", json!({"winner_ids": ["ann"], "loser_ids": ["bob"]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        post_match(
            ADMIN_TOKEN,
            json!({"winner_ids": ["ann", "bob", "cid"], "loser_ids": ["dee"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_composition");

    let (status, body) = send(
        &app,
        post_match(ADMIN_TOKEN, json!({"winner_ids": ["ann"], "loser_ids": ["nobody"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "participant_not_found");

    let (status, history) = send(
        &app,
        Request::builder()
            .uri("/matches")
            .header("authorization", format!("Bearer {}", ADMIN_TOKEN))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(history.as_array().unwrap().is_empty());

    let (status, _) = send(&app, get("/matches")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for participant in state.repository().list_all().await.unwrap() {
        assert_eq!(participant.rating, 500);
    }
    state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_http_health_probes() {
    let (app, state) = http_app().await;

    let (status, health) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["stats"]["participants"], 4);

    state.shutdown().await.unwrap();
    let (status, _) = send(&app, get("/alive")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

//! Ladder HTTP routes
//!
//! A thin transport: extract the caller and the payload, hand them to
//! [`LadderService`](crate::service::LadderService) and serialize the result.

use crate::api::error::ApiError;
use crate::auth::Principal;
use crate::error::LadderError;
use crate::ladder::{
    LeaderboardEntry, MatchHistoryEntry, MatchResolution, ProfileStats, RecordMatchRequest,
};
use crate::service::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Query parameters for the match history listing
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Build the ladder API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/matches", get(list_matches).post(record_match))
        .route("/leaderboard", get(leaderboard))
        .route("/profiles/{id}", get(profile))
        .with_state(state)
}

/// Token from an `Authorization: Bearer <token>` header
///
/// A missing header is no token; any other scheme is rejected.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, LadderError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(LadderError::Unauthenticated)
}

async fn resolve_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Principal>, ApiError> {
    let token = bearer_token(headers)?;
    Ok(state.principal_provider().resolve(token).await?)
}

async fn record_match(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RecordMatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MatchResolution>), ApiError> {
    let principal = resolve_principal(&state, &headers).await?;
    let Json(request) = payload.map_err(|rejection| LadderError::InvalidRequest {
        reason: rejection.body_text(),
    })?;

    let resolution = state
        .ladder()
        .record_match(principal.as_ref(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(resolution)))
}

async fn list_matches(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MatchHistoryEntry>>, ApiError> {
    let principal = resolve_principal(&state, &headers).await?;
    let entries = state
        .ladder()
        .match_history(principal.as_ref(), query.limit)
        .await?;
    Ok(Json(entries))
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    Ok(Json(state.ladder().leaderboard().await?))
}

async fn profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProfileStats>, ApiError> {
    debug!("Profile requested for {}", id);
    Ok(Json(state.ladder().profile(&id).await?))
}

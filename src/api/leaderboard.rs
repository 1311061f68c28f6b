use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::MaybeUser;
use crate::api::pagination::clamp_top;
use crate::core::state::AppState;
use crate::schemas::leaderboard::LeaderboardResponse;
use crate::services::leaderboard;

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardQuery {
    #[serde(default)]
    top: Option<usize>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(global_leaderboard))
        .route("/quiz/:quiz_id", get(quiz_leaderboard))
        .route("/category/:category", get(category_leaderboard))
}

async fn global_leaderboard(
    Query(params): Query<LeaderboardQuery>,
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let top = clamp_top(params.top);
    let token = user.as_ref().map(|auth| auth.token.as_str());
    let board = leaderboard::global(&state, top, token).await?;
    Ok(Json(board))
}

async fn quiz_leaderboard(
    Path(quiz_id): Path<Uuid>,
    Query(params): Query<LeaderboardQuery>,
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let top = clamp_top(params.top);
    let token = user.as_ref().map(|auth| auth.token.as_str());
    let board = leaderboard::for_quiz(&state, quiz_id, top, token).await?;
    Ok(Json(board))
}

/// Quiz categories live in the catalog service and results only store quiz
/// ids, so a category board needs a catalog-side index that does not exist
/// yet. Advertised in the route table but answered honestly.
async fn category_leaderboard(
    Path(category): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    Err(ApiError::NotImplemented(format!(
        "Leaderboard for category '{category}' is not implemented"
    )))
}

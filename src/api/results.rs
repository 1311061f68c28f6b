use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{
    clamp_page, clamp_page_size, PaginatedResponse, ADMIN_PAGE_SIZE, LIST_PAGE_SIZE,
};
use crate::core::state::AppState;
use crate::schemas::result::{
    EnrichedResultResponse, ResultResponse, SubmitResultRequest, UserStatsResponse,
};
use crate::services::results;

#[derive(Debug, Deserialize)]
pub(crate) struct ResultListQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default, alias = "pageSize")]
    page_size: Option<i64>,
    #[serde(default)]
    search: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_result).get(list_results))
        .route("/:result_id", get(get_result))
        .route("/user/:user_id", get(list_results_by_user))
        .route("/quiz/:quiz_id", get(list_results_by_quiz))
        .route("/stats/:user_id", get(get_user_stats))
}

async fn submit_result(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    let result = results::submit(&state, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn get_result(
    Path(result_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ResultResponse>, ApiError> {
    let (result, answers) = results::fetch_result(state.db(), result_id).await?;

    if result.user_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden("You can only view your own results"));
    }

    Ok(Json(ResultResponse::from_db(result, answers)))
}

async fn list_results_by_user(
    Path(user_id): Path<Uuid>,
    Query(params): Query<ResultListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ResultResponse>>, ApiError> {
    if user_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden("You can only view your own results"));
    }

    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size, LIST_PAGE_SIZE);
    let (items, total) = results::page_for_user(state.db(), user_id, page, page_size).await?;

    Ok(Json(PaginatedResponse::new(items, page, page_size, total)))
}

/// Public: quiz result listings back the quiz detail page for anonymous
/// visitors.
async fn list_results_by_quiz(
    Path(quiz_id): Path<Uuid>,
    Query(params): Query<ResultListQuery>,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ResultResponse>>, ApiError> {
    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size, LIST_PAGE_SIZE);
    let (items, total) = results::page_for_quiz(state.db(), quiz_id, page, page_size).await?;

    Ok(Json(PaginatedResponse::new(items, page, page_size, total)))
}

async fn list_results(
    Query(params): Query<ResultListQuery>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<EnrichedResultResponse>>, ApiError> {
    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size, ADMIN_PAGE_SIZE);
    let search = params.search.as_deref().map(str::trim).filter(|term| !term.is_empty());

    let (items, total) =
        results::admin_page(&state, search, page, page_size, Some(&admin.token)).await?;

    Ok(Json(PaginatedResponse::new(items, page, page_size, total)))
}

async fn get_user_stats(
    Path(user_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserStatsResponse>, ApiError> {
    if user_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden("You can only view your own statistics"));
    }

    let stats = results::user_stats(state.db(), user_id).await?;
    Ok(Json(stats))
}

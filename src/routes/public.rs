use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::public::{LeaderboardEntry, TableSchedule, TeamProfile},
    error::AppError,
    services::query_service,
    state::SharedState,
};

/// Read-only endpoints available without a team session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/leaderboard", get(get_leaderboard))
        .route("/public/schedule", get(get_schedule))
        .route("/public/teams/{id}", get(get_team_profile))
}

/// Teams ranked by rating.
#[utoipa::path(
    get,
    path = "/public/leaderboard",
    tag = "public",
    responses((status = 200, description = "Leaderboard", body = [LeaderboardEntry]))
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(query_service::get_leaderboard(&state).await?))
}

/// Current match and queue of each table.
#[utoipa::path(
    get,
    path = "/public/schedule",
    tag = "public",
    responses((status = 200, description = "Table schedule", body = [TableSchedule]))
)]
pub async fn get_schedule(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TableSchedule>>, AppError> {
    Ok(Json(query_service::get_schedule(&state).await?))
}

/// Public profile of a team.
#[utoipa::path(
    get,
    path = "/public/teams/{id}",
    tag = "public",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team profile", body = TeamProfile),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn get_team_profile(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamProfile>, AppError> {
    Ok(Json(query_service::get_team_profile(&state, id).await?))
}

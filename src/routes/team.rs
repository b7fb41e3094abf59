use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};

use crate::{
    dto::team::{NotificationResponse, TeamStateResponse, ToggleResponse},
    error::AppError,
    routes::acting_team,
    services::{notification, pairing, query_service},
    state::SharedState,
};

/// Endpoints acting on behalf of the calling team.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/toggle_status", post(toggle_status))
        .route("/api/check_notifications", get(check_notifications))
}

/// Current status of the calling team and its next match.
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "team",
    params(("X-Team-Id" = String, Header, description = "Acting team identifier")),
    responses(
        (status = 200, description = "Team status", body = TeamStateResponse),
        (status = 401, description = "Missing or malformed team header"),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn get_status(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<TeamStateResponse>, AppError> {
    let team_id = acting_team(&headers)?;
    Ok(Json(query_service::get_state(&state, team_id).await?))
}

/// Start or stop searching for an opponent.
#[utoipa::path(
    post,
    path = "/api/toggle_status",
    tag = "team",
    params(("X-Team-Id" = String, Header, description = "Acting team identifier")),
    responses(
        (status = 200, description = "Toggle applied", body = ToggleResponse),
        (status = 409, description = "Team already in a match or no table configured")
    )
)]
pub async fn toggle_status(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ToggleResponse>, AppError> {
    let team_id = acting_team(&headers)?;
    Ok(Json(pairing::toggle_availability(&state, team_id).await?))
}

/// Poll for the one-shot upcoming match notice.
#[utoipa::path(
    get,
    path = "/api/check_notifications",
    tag = "team",
    params(("X-Team-Id" = String, Header, description = "Acting team identifier")),
    responses((status = 200, description = "Notice, if due", body = NotificationResponse))
)]
pub async fn check_notifications(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<NotificationResponse>, AppError> {
    let team_id = acting_team(&headers)?;
    Ok(Json(notification::check_notification(&state, team_id).await?))
}

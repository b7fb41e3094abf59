use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::matches::{MatchSnapshot, ScoreOutcome, ScoreResponse, SubmitScoreRequest},
    error::AppError,
    routes::acting_team,
    services::{lifecycle_service, query_service, scoring},
    state::SharedState,
};

/// Endpoints operating on a single match.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/matches/{id}", get(get_match))
        .route("/api/matches/{id}/ready", post(set_ready))
        .route("/api/matches/{id}/done", post(set_done))
        .route("/api/matches/{id}/score", post(submit_score))
        .route("/api/matches/{id}/reset_mismatch", post(reset_mismatch))
}

/// Snapshot of a match.
#[utoipa::path(
    get,
    path = "/api/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match snapshot", body = MatchSnapshot),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(query_service::get_match_details(&state, id).await?))
}

/// Confirm the calling team is at the table.
#[utoipa::path(
    post,
    path = "/api/matches/{id}/ready",
    tag = "matches",
    params(
        ("id" = Uuid, Path, description = "Match identifier"),
        ("X-Team-Id" = String, Header, description = "Acting team identifier")
    ),
    responses(
        (status = 200, description = "Readiness recorded", body = MatchSnapshot),
        (status = 401, description = "Team does not play this match"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn set_ready(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<MatchSnapshot>, AppError> {
    let team_id = acting_team(&headers)?;
    Ok(Json(lifecycle_service::set_ready(&state, id, team_id).await?))
}

/// Report the match as played.
#[utoipa::path(
    post,
    path = "/api/matches/{id}/done",
    tag = "matches",
    params(
        ("id" = Uuid, Path, description = "Match identifier"),
        ("X-Team-Id" = String, Header, description = "Acting team identifier")
    ),
    responses(
        (status = 200, description = "Done flag recorded", body = MatchSnapshot),
        (status = 409, description = "Match has not started")
    )
)]
pub async fn set_done(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<MatchSnapshot>, AppError> {
    let team_id = acting_team(&headers)?;
    Ok(Json(lifecycle_service::set_done(&state, id, team_id).await?))
}

/// Submit the score from the calling team's side.
///
/// A disagreement with the opponent's claim is answered with `409 Conflict` and the snapshot.
#[utoipa::path(
    post,
    path = "/api/matches/{id}/score",
    tag = "matches",
    params(
        ("id" = Uuid, Path, description = "Match identifier"),
        ("X-Team-Id" = String, Header, description = "Acting team identifier")
    ),
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score recorded or match completed", body = ScoreResponse),
        (status = 400, description = "Tied score or a score above 10"),
        (status = 409, description = "Claims disagree or match not in play", body = ScoreResponse)
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<Response, AppError> {
    let team_id = acting_team(&headers)?;
    payload.validate()?;
    let response = scoring::submit_score(
        &state,
        id,
        team_id,
        payload.my_score,
        payload.opponent_score,
    )
    .await?;

    let status = match response.outcome {
        ScoreOutcome::Mismatch => StatusCode::CONFLICT,
        ScoreOutcome::Completed | ScoreOutcome::WaitingForOpponent => StatusCode::OK,
    };
    Ok((status, Json(response)).into_response())
}

/// Drop both claims of a disputed match.
#[utoipa::path(
    post,
    path = "/api/matches/{id}/reset_mismatch",
    tag = "matches",
    params(
        ("id" = Uuid, Path, description = "Match identifier"),
        ("X-Team-Id" = String, Header, description = "Acting team identifier")
    ),
    responses(
        (status = 200, description = "Submissions cleared", body = MatchSnapshot),
        (status = 409, description = "Match already completed")
    )
)]
pub async fn reset_mismatch(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<MatchSnapshot>, AppError> {
    let team_id = acting_team(&headers)?;
    Ok(Json(scoring::reset_mismatch(&state, id, team_id).await?))
}

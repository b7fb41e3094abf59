use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::post,
};

use crate::{
    dto::admin::{CreateTableRequest, CreateTeamRequest, TableSummary, TeamSummary},
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints registering teams and tables.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/teams", post(create_team))
        .route("/admin/tables", post(create_table))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Register a new team.
#[utoipa::path(
    post,
    path = "/admin/teams",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team created", body = TeamSummary),
        (status = 400, description = "Invalid or duplicate name")
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<Json<TeamSummary>, AppError> {
    let summary = admin_service::create_team(&state, payload).await?;
    Ok(Json(summary))
}

/// Add a table.
#[utoipa::path(
    post,
    path = "/admin/tables",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    request_body = CreateTableRequest,
    responses((status = 200, description = "Table created", body = TableSummary))
)]
pub async fn create_table(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTableRequest>,
) -> Result<Json<TableSummary>, AppError> {
    let summary = admin_service::create_table(&state, payload).await?;
    Ok(Json(summary))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match state.config().admin_token.as_deref() {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized("admin token not configured".into())),
    }
}

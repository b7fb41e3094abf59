use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document of the table match service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::team::get_status,
        crate::routes::team::toggle_status,
        crate::routes::team::check_notifications,
        crate::routes::matches::get_match,
        crate::routes::matches::set_ready,
        crate::routes::matches::set_done,
        crate::routes::matches::submit_score,
        crate::routes::matches::reset_mismatch,
        crate::routes::public::get_leaderboard,
        crate::routes::public::get_schedule,
        crate::routes::public::get_team_profile,
        crate::routes::admin::create_team,
        crate::routes::admin::create_table,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::team::TeamStateResponse,
            crate::dto::team::ToggleResponse,
            crate::dto::team::ToggleOutcome,
            crate::dto::team::NotificationResponse,
            crate::dto::matches::MatchSnapshot,
            crate::dto::matches::MatchSide,
            crate::dto::matches::SubmissionView,
            crate::dto::matches::SubmitScoreRequest,
            crate::dto::matches::ScoreResponse,
            crate::dto::matches::ScoreOutcome,
            crate::dto::public::LeaderboardEntry,
            crate::dto::public::TableSchedule,
            crate::dto::public::ScheduledMatch,
            crate::dto::public::TeamProfile,
            crate::dto::public::RatingPoint,
            crate::dto::admin::CreateTeamRequest,
            crate::dto::admin::CreateTableRequest,
            crate::dto::admin::TeamSummary,
            crate::dto::admin::TableSummary,
            crate::dao::models::TeamStatus,
            crate::dao::models::MatchStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "team", description = "Status and matchmaking of the calling team"),
        (name = "matches", description = "Ready check, play and score reconciliation"),
        (name = "public", description = "Leaderboard, schedule and team profiles"),
        (name = "admin", description = "Team and table registration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/api/status",
            "/api/toggle_status",
            "/api/check_notifications",
            "/api/matches/{id}",
            "/api/matches/{id}/score",
            "/public/leaderboard",
            "/public/teams/{id}",
            "/admin/tables",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

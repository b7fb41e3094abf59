use axum::{Router, http::HeaderMap};
use uuid::Uuid;

use crate::{error::AppError, state::SharedState};

pub mod admin;
pub mod docs;
pub mod health;
pub mod matches;
pub mod public;
pub mod team;

/// Header carrying the acting team, set by the session layer in front of the engine.
pub const TEAM_ID_HEADER: &str = "x-team-id";

/// Identifier of the team on whose behalf the request is made.
pub(crate) fn acting_team(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get(TEAM_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing team header `X-Team-Id`".into()))?;

    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Unauthorized("malformed team header `X-Team-Id`".into()))
}

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(team::router())
        .merge(matches::router())
        .merge(public::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router());

    api_router.with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn acting_team_requires_a_valid_uuid() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            acting_team(&headers),
            Err(AppError::Unauthorized(_))
        ));

        headers.insert(TEAM_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            acting_team(&headers),
            Err(AppError::Unauthorized(_))
        ));

        let id = Uuid::new_v4();
        headers.insert(
            TEAM_ID_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(acting_team(&headers).unwrap(), id);
    }
}

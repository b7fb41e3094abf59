use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::lifecycle::InvalidTransition};

/// Failures of engine operations.
///
/// `NotFound` and `Unauthorized` end the call; nothing is retried internally.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The store rejected or could not complete a call.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No store is installed yet, or the supervisor gave up on it.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The acting team does not take part in the match.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed request data, e.g. a tied score or a duplicate name.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The team or match is not in a status that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Unknown team or match.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation could not acquire the engine gate in time.
    #[error("operation timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

/// Errors answered by the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed payload or rejected input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or foreign team header, wrong admin token, or a non-participant.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Unknown resource.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation not allowed in the current match or team status.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Storage missing, failing, or the engine is saturated.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code sent next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "invalid_input",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "invalid_state",
            AppError::ServiceUnavailable(_) => "unavailable",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                warn!(error = %source, "storage call failed");
                AppError::ServiceUnavailable(source.to_string())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("no match store available".into()),
            ServiceError::Timeout => AppError::ServiceUnavailable("engine busy, retry later".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
        });
        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::MatchStatus;
    use crate::state::lifecycle::MatchEvent;

    #[test]
    fn service_errors_map_to_http_status() {
        let cases = [
            (ServiceError::NotFound("match".into()), StatusCode::NOT_FOUND, "not_found"),
            (ServiceError::InvalidState("busy".into()), StatusCode::CONFLICT, "invalid_state"),
            (ServiceError::Unauthorized("nope".into()), StatusCode::UNAUTHORIZED, "unauthorized"),
            (ServiceError::InvalidInput("tie".into()), StatusCode::BAD_REQUEST, "invalid_input"),
            (ServiceError::Degraded, StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            (ServiceError::Timeout, StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        ];

        for (err, expected, code) in cases {
            let app_error = AppError::from(err);
            assert_eq!(app_error.code(), code);
            assert_eq!(app_error.into_response().status(), expected);
        }
    }

    #[test]
    fn invalid_transition_is_a_state_conflict() {
        let err: ServiceError = InvalidTransition {
            from: MatchStatus::Completed,
            event: MatchEvent::BothDone,
        }
        .into();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}

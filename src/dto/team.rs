use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::TeamStatus, dto::matches::MatchSnapshot};

/// Current status of the acting team with its earliest live match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamStateResponse {
    pub team_id: Uuid,
    pub name: String,
    pub status: TeamStatus,
    pub rating: i32,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub current_match: Option<MatchSnapshot>,
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The team stopped searching.
    Cancelled,
    /// An opponent was claimed and a match scheduled.
    MatchFound,
    /// No opponent was free; the team is now searching.
    Searching,
}

/// Response of `POST /api/toggle_status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    /// Team status after the toggle.
    pub status: TeamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
}

/// Upcoming-match notice, reported at most once per match.
#[derive(Debug, Clone, Serialize, ToSchema, Default)]
pub struct NotificationResponse {
    pub notify: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    /// Whole minutes left before the scheduled start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_until: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
}

impl NotificationResponse {
    /// Nothing to announce.
    pub fn silent() -> Self {
        Self::default()
    }
}

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{MatchStatus, TeamStatus};

/// Row of the public leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub team_id: Uuid,
    pub name: String,
    pub rating: i32,
    pub plays: u32,
    pub wins: u32,
    pub losses: u32,
}

/// Match as listed on the public schedule.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduledMatch {
    pub match_id: Uuid,
    pub status: MatchStatus,
    pub scheduled_start: String,
    pub team1_name: String,
    pub team2_name: String,
}

/// Current match and queue of one table.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableSchedule {
    pub table_id: Uuid,
    pub table_name: String,
    /// Match holding the table, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<ScheduledMatch>,
    /// Pending matches waiting for the table, earliest first.
    pub queue: Vec<ScheduledMatch>,
}

/// Rating after a completed match; the first point is the initial rating.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct RatingPoint {
    pub rating: i32,
    pub recorded_at: String,
}

/// Public profile of a team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamProfile {
    pub team_id: Uuid,
    pub name: String,
    pub status: TeamStatus,
    pub rating: i32,
    pub plays: u32,
    pub wins: u32,
    pub losses: u32,
    /// Percentage of completed matches won, one decimal.
    pub win_rate: f64,
    pub rating_history: Vec<RatingPoint>,
}

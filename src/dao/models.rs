use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Matchmaking status mirrored on each team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    /// Idle, not looking for an opponent.
    NoMatch,
    /// Searching for an opponent.
    Available,
    /// Paired, match scheduled but not started.
    MatchPending,
    /// Match clock is running or scores are being reconciled.
    MatchActive,
}

impl TeamStatus {
    /// Whether the team is reserved by a live match.
    pub fn in_match(self) -> bool {
        matches!(self, TeamStatus::MatchPending | TeamStatus::MatchActive)
    }

    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            TeamStatus::NoMatch => "no_match",
            TeamStatus::Available => "available",
            TeamStatus::MatchPending => "match_pending",
            TeamStatus::MatchActive => "match_active",
        }
    }

    /// Parse the storage representation produced by [`TeamStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "no_match" => Some(TeamStatus::NoMatch),
            "available" => Some(TeamStatus::Available),
            "match_pending" => Some(TeamStatus::MatchPending),
            "match_active" => Some(TeamStatus::MatchActive),
            _ => None,
        }
    }
}

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Scheduled, waiting for its slot on the table.
    Pending,
    /// Table is free and teams must confirm presence.
    ReadyCheck,
    /// Match clock started.
    Active,
    /// Both teams reported the match as played; waiting for scores.
    Finished,
    /// Scores reconciled, ratings applied.
    Completed,
}

impl MatchStatus {
    /// Every status except [`MatchStatus::Completed`].
    pub const LIVE: [MatchStatus; 4] = [
        MatchStatus::Pending,
        MatchStatus::ReadyCheck,
        MatchStatus::Active,
        MatchStatus::Finished,
    ];

    /// Whether the match still reserves its two teams.
    pub fn is_live(self) -> bool {
        !matches!(self, MatchStatus::Completed)
    }

    /// Whether the match holds its table exclusively.
    pub fn occupies_table(self) -> bool {
        matches!(
            self,
            MatchStatus::ReadyCheck | MatchStatus::Active | MatchStatus::Finished
        )
    }

    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::ReadyCheck => "ready_check",
            MatchStatus::Active => "active",
            MatchStatus::Finished => "finished",
            MatchStatus::Completed => "completed",
        }
    }

    /// Parse the storage representation produced by [`MatchStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(MatchStatus::Pending),
            "ready_check" => Some(MatchStatus::ReadyCheck),
            "active" => Some(MatchStatus::Active),
            "finished" => Some(MatchStatus::Finished),
            "completed" => Some(MatchStatus::Completed),
            _ => None,
        }
    }
}

/// Representation of a team stored in persistence and shared across layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name chosen for the team.
    pub name: String,
    /// Matchmaking status mirror.
    pub status: TeamStatus,
    /// Current Elo rating.
    pub rating: i32,
    /// Completed matches played.
    pub plays: u32,
    /// Completed matches won.
    pub wins: u32,
    /// Completed matches lost.
    pub losses: u32,
    /// Registration timestamp.
    pub created_at: OffsetDateTime,
}

impl TeamEntity {
    /// Build a freshly registered team.
    pub fn new(name: String, rating: i32, created_at: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            status: TeamStatus::NoMatch,
            rating,
            plays: 0,
            wins: 0,
            losses: 0,
            created_at,
        }
    }
}

/// Physical table on which matches are played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntity {
    /// Stable identifier for the table.
    pub id: Uuid,
    /// Human readable table name.
    pub name: String,
    /// Creation timestamp, also used to order tables.
    pub created_at: OffsetDateTime,
}

impl TableEntity {
    /// Build a new table.
    pub fn new(name: String, created_at: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at,
        }
    }
}

/// Which side of a match a team plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `team1` slot (the team that requested the pairing).
    Team1,
    /// `team2` slot (the claimed opponent).
    Team2,
}

/// Aggregate match record persisted by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// Team that requested the pairing.
    pub team1_id: Uuid,
    /// Claimed opponent.
    pub team2_id: Uuid,
    /// Table the match is queued on.
    pub table_id: Uuid,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Planned start of the match.
    pub scheduled_start: OffsetDateTime,
    /// Moment the match clock started; only set once active.
    pub timer_start: Option<OffsetDateTime>,
    /// Ready confirmation from team1.
    pub team1_ready: bool,
    /// Ready confirmation from team2.
    pub team2_ready: bool,
    /// Done confirmation from team1.
    pub team1_done: bool,
    /// Done confirmation from team2.
    pub team2_done: bool,
    /// Moment the result was reconciled.
    pub end_time: Option<OffsetDateTime>,
    /// Final score of team1.
    pub score1: Option<u32>,
    /// Final score of team2.
    pub score2: Option<u32>,
    /// Winning team once completed.
    pub winner_id: Option<Uuid>,
    /// Set while both submissions disagree.
    pub mismatch: bool,
    /// Set once the upcoming-match notice fired.
    pub notification_sent: bool,
    /// Creation timestamp, used as a stable tie-breaker.
    pub created_at: OffsetDateTime,
}

impl MatchEntity {
    /// Build a pending match between two reserved teams.
    pub fn pending(
        team1_id: Uuid,
        team2_id: Uuid,
        table_id: Uuid,
        scheduled_start: OffsetDateTime,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            team1_id,
            team2_id,
            table_id,
            status: MatchStatus::Pending,
            scheduled_start,
            timer_start: None,
            team1_ready: false,
            team2_ready: false,
            team1_done: false,
            team2_done: false,
            end_time: None,
            score1: None,
            score2: None,
            winner_id: None,
            mismatch: false,
            notification_sent: false,
            created_at,
        }
    }

    /// Side played by `team_id`, if it participates.
    pub fn side_of(&self, team_id: Uuid) -> Option<Side> {
        if team_id == self.team1_id {
            Some(Side::Team1)
        } else if team_id == self.team2_id {
            Some(Side::Team2)
        } else {
            None
        }
    }

    /// Both participating teams, team1 first.
    pub fn team_ids(&self) -> [Uuid; 2] {
        [self.team1_id, self.team2_id]
    }

    /// Whether both teams confirmed presence.
    pub fn both_ready(&self) -> bool {
        self.team1_ready && self.team2_ready
    }

    /// Whether both teams reported the match as played.
    pub fn both_done(&self) -> bool {
        self.team1_done && self.team2_done
    }
}

/// Score claim made by one team, from its own perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEntity {
    /// Match the claim belongs to.
    pub match_id: Uuid,
    /// Submitting team.
    pub team_id: Uuid,
    /// Points scored by the submitting team.
    pub score_for: u32,
    /// Points scored by its opponent.
    pub score_against: u32,
    /// Last time the claim was written.
    pub submitted_at: OffsetDateTime,
}

/// Append-only rating trajectory point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingHistoryEntity {
    /// Team the rating belongs to.
    pub team_id: Uuid,
    /// Rating after the completed match.
    pub rating: i32,
    /// Moment the rating was recorded.
    pub recorded_at: OffsetDateTime,
}

/// Filter used to list matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    /// Keep only matches in one of these statuses (all when empty).
    pub statuses: Vec<MatchStatus>,
    /// Keep only matches involving this team.
    pub team_id: Option<Uuid>,
    /// Keep only matches queued on this table.
    pub table_id: Option<Uuid>,
}

impl MatchFilter {
    /// Matches that still reserve their teams.
    pub fn live() -> Self {
        Self {
            statuses: MatchStatus::LIVE.to_vec(),
            ..Self::default()
        }
    }

    /// Restrict the filter to a team.
    pub fn for_team(mut self, team_id: Uuid) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Restrict the filter to a table.
    pub fn on_table(mut self, table_id: Uuid) -> Self {
        self.table_id = Some(table_id);
        self
    }

    /// Restrict the filter to the given statuses.
    pub fn with_statuses(mut self, statuses: &[MatchStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    /// Whether `entity` passes the filter.
    pub fn matches(&self, entity: &MatchEntity) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&entity.status))
            && self
                .team_id
                .is_none_or(|team| entity.side_of(team).is_some())
            && self.table_id.is_none_or(|table| entity.table_id == table)
    }
}

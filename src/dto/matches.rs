//! Payloads describing a single match and the actions teams take on it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{MatchEntity, MatchStatus, SubmissionEntity, TableEntity, TeamEntity};
use crate::dto::format_timestamp;

/// Highest score a side can report for one table match.
pub const MAX_SCORE: u32 = 10;

/// Score claim as submitted by one side.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct SubmissionView {
    pub score_for: u32,
    pub score_against: u32,
}

/// One side of a match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSide {
    pub team_id: Uuid,
    pub name: String,
    pub ready: bool,
    pub done: bool,
    /// Claim filed by this side, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionView>,
}

/// Consistent view of a match with participant names and the submission state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSnapshot {
    pub id: Uuid,
    pub status: MatchStatus,
    pub table_id: Uuid,
    pub table_name: Option<String>,
    pub scheduled_start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub team1: MatchSide,
    pub team2: MatchSide,
    /// Final score from team1's perspective once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score1: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score2: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<Uuid>,
    pub mismatch: bool,
    /// Teams that still owe a score submission.
    pub awaiting_team_ids: Vec<Uuid>,
    pub awaiting_team_names: Vec<String>,
}

impl MatchSnapshot {
    /// Assemble the snapshot from stored records.
    ///
    /// Missing team records fall back to an empty name rather than failing the read.
    pub fn build(
        entity: &MatchEntity,
        team1: Option<&TeamEntity>,
        team2: Option<&TeamEntity>,
        table: Option<&TableEntity>,
        submissions: &[SubmissionEntity],
    ) -> Self {
        let side = |team_id: Uuid, team: Option<&TeamEntity>, ready: bool, done: bool| {
            let submission = submissions
                .iter()
                .find(|submission| submission.team_id == team_id)
                .map(|submission| SubmissionView {
                    score_for: submission.score_for,
                    score_against: submission.score_against,
                });
            MatchSide {
                team_id,
                name: team.map(|team| team.name.clone()).unwrap_or_default(),
                ready,
                done,
                submission,
            }
        };

        let team1 = side(entity.team1_id, team1, entity.team1_ready, entity.team1_done);
        let team2 = side(entity.team2_id, team2, entity.team2_ready, entity.team2_done);
        let (awaiting_team_ids, awaiting_team_names): (Vec<Uuid>, Vec<String>) = [&team1, &team2]
            .into_iter()
            .filter(|side| side.submission.is_none())
            .map(|side| (side.team_id, side.name.clone()))
            .unzip();

        Self {
            id: entity.id,
            status: entity.status,
            table_id: entity.table_id,
            table_name: table.map(|table| table.name.clone()),
            scheduled_start: format_timestamp(entity.scheduled_start),
            timer_start: entity.timer_start.map(format_timestamp),
            end_time: entity.end_time.map(format_timestamp),
            awaiting_team_ids,
            awaiting_team_names,
            team1,
            team2,
            score1: entity.score1,
            score2: entity.score2,
            winner_id: entity.winner_id,
            mismatch: entity.mismatch,
        }
    }
}

/// Score claim sent by a team from its own perspective.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitScoreRequest {
    #[validate(range(max = 10))]
    #[schema(maximum = 10)]
    pub my_score: u32,
    #[validate(range(max = 10))]
    #[schema(maximum = 10)]
    pub opponent_score: u32,
}

/// Result of a score submission.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOutcome {
    /// Both claims agreed; the match is final and ratings were updated.
    Completed,
    /// Only this side has submitted so far.
    WaitingForOpponent,
    /// The two claims disagree; either side may reset and resubmit.
    Mismatch,
}

/// Response returned after a score submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreResponse {
    pub outcome: ScoreOutcome,
    #[serde(rename = "match")]
    pub snapshot: MatchSnapshot,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn snapshot_lists_teams_still_owing_a_score() {
        let at = datetime!(2025-05-10 20:00 UTC);
        let home = TeamEntity::new("Home".into(), 1000, at);
        let away = TeamEntity::new("Away".into(), 1000, at);
        let mut entity = MatchEntity::pending(home.id, away.id, Uuid::new_v4(), at, at);
        entity.status = MatchStatus::Finished;
        let submissions = [SubmissionEntity {
            match_id: entity.id,
            team_id: away.id,
            score_for: 3,
            score_against: 10,
            submitted_at: at,
        }];

        let snapshot = MatchSnapshot::build(&entity, Some(&home), Some(&away), None, &submissions);
        assert_eq!(snapshot.awaiting_team_ids, vec![home.id]);
        assert_eq!(snapshot.awaiting_team_names, vec!["Home".to_owned()]);
        assert_eq!(
            snapshot.team2.submission,
            Some(SubmissionView {
                score_for: 3,
                score_against: 10
            })
        );
        assert_eq!(snapshot.scheduled_start, "2025-05-10T20:00:00Z");
    }

    #[test]
    fn score_request_rejects_values_above_ten() {
        let within = SubmitScoreRequest {
            my_score: MAX_SCORE,
            opponent_score: 0,
        };
        assert!(within.validate().is_ok());

        let beyond = SubmitScoreRequest {
            my_score: 4000,
            opponent_score: 3,
        };
        let errors = beyond.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("my_score"));
    }
}

use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    MatchEntity, MatchStatus, RatingHistoryEntity, SubmissionEntity, TableEntity, TeamEntity,
    TeamStatus,
};

pub const TEAM_COLLECTION_NAME: &str = "teams";
pub const TABLE_COLLECTION_NAME: &str = "tables";
pub const MATCH_COLLECTION_NAME: &str = "matches";
pub const SUBMISSION_COLLECTION_NAME: &str = "match_submissions";
pub const RATING_COLLECTION_NAME: &str = "rating_history";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub status: String,
    pub rating: i32,
    pub plays: i64,
    pub wins: i64,
    pub losses: i64,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTableDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub team1_id: String,
    pub team2_id: String,
    pub table_id: String,
    pub status: String,
    pub scheduled_start_ms: i64,
    pub timer_start_ms: Option<i64>,
    pub team1_ready: bool,
    pub team2_ready: bool,
    pub team1_done: bool,
    pub team2_done: bool,
    pub end_time_ms: Option<i64>,
    pub score1: Option<i64>,
    pub score2: Option<i64>,
    pub winner_id: Option<String>,
    #[serde(default)]
    pub mismatch: bool,
    #[serde(default)]
    pub notification_sent: bool,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSubmissionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub match_id: String,
    pub team_id: String,
    pub score_for: i64,
    pub score_against: i64,
    pub submitted_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRatingDocument {
    pub team_id: String,
    pub rating: i32,
    pub recorded_at_ms: i64,
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn submission_key(match_id: Uuid, team_id: Uuid) -> String {
    format!("{match_id}:{team_id}")
}

pub fn to_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(collection: &'static str, ms: i64) -> MongoResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).map_err(|err| {
        MongoDaoError::Decode {
            collection,
            message: format!("timestamp {ms} out of range: {err}"),
        }
    })
}

fn parse_id(collection: &'static str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::Decode {
        collection,
        message: format!("invalid identifier `{raw}`: {err}"),
    })
}

fn parse_score(collection: &'static str, raw: i64) -> MongoResult<u32> {
    u32::try_from(raw).map_err(|_| MongoDaoError::Decode {
        collection,
        message: format!("score {raw} out of range"),
    })
}

fn parse_count(collection: &'static str, raw: i64) -> MongoResult<u32> {
    u32::try_from(raw).map_err(|_| MongoDaoError::Decode {
        collection,
        message: format!("counter {raw} out of range"),
    })
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            status: value.status.as_str().to_owned(),
            rating: value.rating,
            plays: i64::from(value.plays),
            wins: i64::from(value.wins),
            losses: i64::from(value.losses),
            created_at_ms: to_millis(value.created_at),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> MongoResult<Self> {
        const COLLECTION: &str = TEAM_COLLECTION_NAME;
        let status = TeamStatus::parse(&value.status).ok_or_else(|| MongoDaoError::Decode {
            collection: COLLECTION,
            message: format!("unknown team status `{}`", value.status),
        })?;

        Ok(Self {
            id: parse_id(COLLECTION, &value.id)?,
            name: value.name,
            status,
            rating: value.rating,
            plays: parse_count(COLLECTION, value.plays)?,
            wins: parse_count(COLLECTION, value.wins)?,
            losses: parse_count(COLLECTION, value.losses)?,
            created_at: from_millis(COLLECTION, value.created_at_ms)?,
        })
    }
}

impl From<TableEntity> for MongoTableDocument {
    fn from(value: TableEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            created_at_ms: to_millis(value.created_at),
        }
    }
}

impl TryFrom<MongoTableDocument> for TableEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTableDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(TABLE_COLLECTION_NAME, &value.id)?,
            name: value.name,
            created_at: from_millis(TABLE_COLLECTION_NAME, value.created_at_ms)?,
        })
    }
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            team1_id: value.team1_id.to_string(),
            team2_id: value.team2_id.to_string(),
            table_id: value.table_id.to_string(),
            status: value.status.as_str().to_owned(),
            scheduled_start_ms: to_millis(value.scheduled_start),
            timer_start_ms: value.timer_start.map(to_millis),
            team1_ready: value.team1_ready,
            team2_ready: value.team2_ready,
            team1_done: value.team1_done,
            team2_done: value.team2_done,
            end_time_ms: value.end_time.map(to_millis),
            score1: value.score1.map(i64::from),
            score2: value.score2.map(i64::from),
            winner_id: value.winner_id.map(|id| id.to_string()),
            mismatch: value.mismatch,
            notification_sent: value.notification_sent,
            created_at_ms: to_millis(value.created_at),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        const COLLECTION: &str = MATCH_COLLECTION_NAME;
        let status = MatchStatus::parse(&value.status).ok_or_else(|| MongoDaoError::Decode {
            collection: COLLECTION,
            message: format!("unknown match status `{}`", value.status),
        })?;

        Ok(Self {
            id: parse_id(COLLECTION, &value.id)?,
            team1_id: parse_id(COLLECTION, &value.team1_id)?,
            team2_id: parse_id(COLLECTION, &value.team2_id)?,
            table_id: parse_id(COLLECTION, &value.table_id)?,
            status,
            scheduled_start: from_millis(COLLECTION, value.scheduled_start_ms)?,
            timer_start: value
                .timer_start_ms
                .map(|ms| from_millis(COLLECTION, ms))
                .transpose()?,
            team1_ready: value.team1_ready,
            team2_ready: value.team2_ready,
            team1_done: value.team1_done,
            team2_done: value.team2_done,
            end_time: value
                .end_time_ms
                .map(|ms| from_millis(COLLECTION, ms))
                .transpose()?,
            score1: value
                .score1
                .map(|raw| parse_score(COLLECTION, raw))
                .transpose()?,
            score2: value
                .score2
                .map(|raw| parse_score(COLLECTION, raw))
                .transpose()?,
            winner_id: value
                .winner_id
                .as_deref()
                .map(|raw| parse_id(COLLECTION, raw))
                .transpose()?,
            mismatch: value.mismatch,
            notification_sent: value.notification_sent,
            created_at: from_millis(COLLECTION, value.created_at_ms)?,
        })
    }
}

impl From<SubmissionEntity> for MongoSubmissionDocument {
    fn from(value: SubmissionEntity) -> Self {
        Self {
            id: submission_key(value.match_id, value.team_id),
            match_id: value.match_id.to_string(),
            team_id: value.team_id.to_string(),
            score_for: i64::from(value.score_for),
            score_against: i64::from(value.score_against),
            submitted_at_ms: to_millis(value.submitted_at),
        }
    }
}

impl TryFrom<MongoSubmissionDocument> for SubmissionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSubmissionDocument) -> MongoResult<Self> {
        const COLLECTION: &str = SUBMISSION_COLLECTION_NAME;
        Ok(Self {
            match_id: parse_id(COLLECTION, &value.match_id)?,
            team_id: parse_id(COLLECTION, &value.team_id)?,
            score_for: parse_score(COLLECTION, value.score_for)?,
            score_against: parse_score(COLLECTION, value.score_against)?,
            submitted_at: from_millis(COLLECTION, value.submitted_at_ms)?,
        })
    }
}

impl From<RatingHistoryEntity> for MongoRatingDocument {
    fn from(value: RatingHistoryEntity) -> Self {
        Self {
            team_id: value.team_id.to_string(),
            rating: value.rating,
            recorded_at_ms: to_millis(value.recorded_at),
        }
    }
}

impl TryFrom<MongoRatingDocument> for RatingHistoryEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRatingDocument) -> MongoResult<Self> {
        Ok(Self {
            team_id: parse_id(RATING_COLLECTION_NAME, &value.team_id)?,
            rating: value.rating,
            recorded_at: from_millis(RATING_COLLECTION_NAME, value.recorded_at_ms)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn match_document_keeps_every_field() {
        let mut entity = MatchEntity::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            datetime!(2025-03-01 18:15 UTC),
            datetime!(2025-03-01 18:00 UTC),
        );
        entity.status = MatchStatus::Completed;
        entity.timer_start = Some(datetime!(2025-03-01 18:16 UTC));
        entity.end_time = Some(datetime!(2025-03-01 18:30 UTC));
        entity.score1 = Some(10);
        entity.score2 = Some(4);
        entity.winner_id = Some(entity.team1_id);
        entity.team1_ready = true;
        entity.team2_done = true;

        let document: MongoMatchDocument = entity.clone().into();
        assert_eq!(document.status, "completed");
        let decoded = MatchEntity::try_from(document).unwrap();
        assert_eq!(decoded, entity);
    }

    #[test]
    fn unknown_status_is_reported_as_decode_error() {
        let mut document: MongoTeamDocument =
            TeamEntity::new("Rackets".into(), 1000, datetime!(2025-03-01 18:00 UTC)).into();
        document.status = "lost".into();

        let err = TeamEntity::try_from(document).unwrap_err();
        assert!(matches!(
            err,
            MongoDaoError::Decode {
                collection: TEAM_COLLECTION_NAME,
                ..
            }
        ));
    }
}

use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save team `{id}`")]
    SaveTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load teams")]
    LoadTeams {
        #[source]
        source: MongoError,
    },
    #[error("failed to claim an available team")]
    ClaimTeam {
        #[source]
        source: MongoError,
    },
    #[error("failed to save table `{id}`")]
    SaveTable {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load tables")]
    LoadTables {
        #[source]
        source: MongoError,
    },
    #[error("failed to save match `{id}`")]
    SaveMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load matches")]
    LoadMatches {
        #[source]
        source: MongoError,
    },
    #[error("failed to write submissions of match `{match_id}`")]
    SaveSubmission {
        match_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load submissions of match `{match_id}`")]
    LoadSubmissions {
        match_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to append rating history of team `{team_id}`")]
    SaveRating {
        team_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load rating history of team `{team_id}`")]
    LoadRatings {
        team_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("cannot decode document from `{collection}`: {message}")]
    Decode {
        collection: &'static str,
        message: String,
    },
}

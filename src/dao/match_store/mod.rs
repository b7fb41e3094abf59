pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        MatchEntity, MatchFilter, RatingHistoryEntity, SubmissionEntity, TableEntity, TeamEntity,
        TeamStatus,
    },
    storage::StorageResult,
};

pub use memory::InMemoryMatchStore;

/// Abstraction over the persistence layer for teams, tables, matches and score submissions.
///
/// Every method is atomic on its own. [`MatchStore::claim_available_team`] is the one
/// conditional update the pairing engine relies on: two concurrent callers never receive the
/// same team.
pub trait MatchStore: Send + Sync {
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn find_team_by_name(&self, name: String)
    -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Teams in registration order.
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn set_team_status(
        &self,
        ids: Vec<Uuid>,
        status: TeamStatus,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically move one `available` team other than `exclude` to `match_pending`.
    fn claim_available_team(
        &self,
        exclude: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;

    /// Tables in creation order.
    fn list_tables(&self) -> BoxFuture<'static, StorageResult<Vec<TableEntity>>>;
    fn save_table(&self, table: TableEntity) -> BoxFuture<'static, StorageResult<()>>;

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Matches passing `filter`, ordered by scheduled start then creation.
    fn list_matches(&self, filter: MatchFilter)
    -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert or replace the submission keyed by `(match_id, team_id)`.
    fn upsert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn list_submissions(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>>;
    fn delete_submissions(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;

    fn append_rating_history(
        &self,
        entry: RatingHistoryEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Rating points for a team, oldest first.
    fn rating_history(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<RatingHistoryEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

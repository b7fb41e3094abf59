use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MATCH_COLLECTION_NAME, MongoMatchDocument, MongoRatingDocument, MongoSubmissionDocument,
        MongoTableDocument, MongoTeamDocument, RATING_COLLECTION_NAME, SUBMISSION_COLLECTION_NAME,
        TABLE_COLLECTION_NAME, TEAM_COLLECTION_NAME, doc_id, submission_key,
    },
};
use crate::dao::{
    match_store::MatchStore,
    models::{
        MatchEntity, MatchFilter, RatingHistoryEntity, SubmissionEntity, TableEntity, TeamEntity,
        TeamStatus,
    },
    storage::StorageResult,
};

/// [`MatchStore`] backed by MongoDB collections.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let indexes: [(&'static str, &'static str, Document, bool); 4] = [
            (TEAM_COLLECTION_NAME, "status", doc! {"status": 1}, false),
            (TEAM_COLLECTION_NAME, "name", doc! {"name": 1}, true),
            (
                MATCH_COLLECTION_NAME,
                "status,scheduled_start_ms",
                doc! {"status": 1, "scheduled_start_ms": 1},
                false,
            ),
            (
                RATING_COLLECTION_NAME,
                "team_id,recorded_at_ms",
                doc! {"team_id": 1, "recorded_at_ms": 1},
                false,
            ),
        ];

        for (collection, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{index}_idx")))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn teams(&self) -> Collection<MongoTeamDocument> {
        self.database().await.collection(TEAM_COLLECTION_NAME)
    }

    async fn tables(&self) -> Collection<MongoTableDocument> {
        self.database().await.collection(TABLE_COLLECTION_NAME)
    }

    async fn matches(&self) -> Collection<MongoMatchDocument> {
        self.database().await.collection(MATCH_COLLECTION_NAME)
    }

    async fn submissions(&self) -> Collection<MongoSubmissionDocument> {
        self.database().await.collection(SUBMISSION_COLLECTION_NAME)
    }

    async fn ratings(&self) -> Collection<MongoRatingDocument> {
        self.database().await.collection(RATING_COLLECTION_NAME)
    }

    async fn find_team(&self, filter: Document) -> MongoResult<Option<TeamEntity>> {
        self.teams()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::LoadTeams { source })?
            .map(TeamEntity::try_from)
            .transpose()
    }

    async fn list_teams(&self) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .teams()
            .await
            .find(doc! {})
            .sort(doc! {"created_at_ms": 1})
            .await
            .map_err(|source| MongoDaoError::LoadTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadTeams { source })?;

        documents.into_iter().map(TeamEntity::try_from).collect()
    }

    async fn save_team(&self, team: TeamEntity) -> MongoResult<()> {
        let id = team.id;
        let document: MongoTeamDocument = team.into();
        self.teams()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTeam { id, source })?;
        Ok(())
    }

    async fn set_team_status(&self, ids: Vec<Uuid>, status: TeamStatus) -> MongoResult<()> {
        let Some(&first) = ids.first() else {
            return Ok(());
        };
        let keys = ids.iter().map(Uuid::to_string).collect::<Vec<_>>();
        self.teams()
            .await
            .update_many(
                doc! {"_id": {"$in": keys}},
                doc! {"$set": {"status": status.as_str()}},
            )
            .await
            .map_err(|source| MongoDaoError::SaveTeam { id: first, source })?;
        Ok(())
    }

    async fn claim_available_team(&self, exclude: Uuid) -> MongoResult<Option<TeamEntity>> {
        // Single-document conditional update: the status filter is the compare, `$set` the swap.
        self.teams()
            .await
            .find_one_and_update(
                doc! {
                    "status": TeamStatus::Available.as_str(),
                    "_id": {"$ne": exclude.to_string()},
                },
                doc! {"$set": {"status": TeamStatus::MatchPending.as_str()}},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::ClaimTeam { source })?
            .map(TeamEntity::try_from)
            .transpose()
    }

    async fn list_tables(&self) -> MongoResult<Vec<TableEntity>> {
        let documents: Vec<MongoTableDocument> = self
            .tables()
            .await
            .find(doc! {})
            .sort(doc! {"created_at_ms": 1})
            .await
            .map_err(|source| MongoDaoError::LoadTables { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadTables { source })?;

        documents.into_iter().map(TableEntity::try_from).collect()
    }

    async fn save_table(&self, table: TableEntity) -> MongoResult<()> {
        let id = table.id;
        let document: MongoTableDocument = table.into();
        self.tables()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTable { id, source })?;
        Ok(())
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        self.matches()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadMatches { source })?
            .map(MatchEntity::try_from)
            .transpose()
    }

    async fn list_matches(&self, filter: MatchFilter) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .matches()
            .await
            .find(match_filter_document(&filter))
            .sort(doc! {"scheduled_start_ms": 1, "created_at_ms": 1})
            .await
            .map_err(|source| MongoDaoError::LoadMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadMatches { source })?;

        documents.into_iter().map(MatchEntity::try_from).collect()
    }

    async fn save_match(&self, entity: MatchEntity) -> MongoResult<()> {
        let id = entity.id;
        let document: MongoMatchDocument = entity.into();
        self.matches()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;
        Ok(())
    }

    async fn upsert_submission(&self, submission: SubmissionEntity) -> MongoResult<()> {
        let match_id = submission.match_id;
        let key = submission_key(submission.match_id, submission.team_id);
        let document: MongoSubmissionDocument = submission.into();
        self.submissions()
            .await
            .replace_one(doc! {"_id": key}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSubmission { match_id, source })?;
        Ok(())
    }

    async fn list_submissions(&self, match_id: Uuid) -> MongoResult<Vec<SubmissionEntity>> {
        let documents: Vec<MongoSubmissionDocument> = self
            .submissions()
            .await
            .find(doc! {"match_id": match_id.to_string()})
            .await
            .map_err(|source| MongoDaoError::LoadSubmissions { match_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadSubmissions { match_id, source })?;

        documents
            .into_iter()
            .map(SubmissionEntity::try_from)
            .collect()
    }

    async fn delete_submissions(&self, match_id: Uuid) -> MongoResult<()> {
        self.submissions()
            .await
            .delete_many(doc! {"match_id": match_id.to_string()})
            .await
            .map_err(|source| MongoDaoError::SaveSubmission { match_id, source })?;
        Ok(())
    }

    async fn append_rating_history(&self, entry: RatingHistoryEntity) -> MongoResult<()> {
        let team_id = entry.team_id;
        let document: MongoRatingDocument = entry.into();
        self.ratings()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveRating { team_id, source })?;
        Ok(())
    }

    async fn rating_history(&self, team_id: Uuid) -> MongoResult<Vec<RatingHistoryEntity>> {
        let documents: Vec<MongoRatingDocument> = self
            .ratings()
            .await
            .find(doc! {"team_id": team_id.to_string()})
            .sort(doc! {"recorded_at_ms": 1})
            .await
            .map_err(|source| MongoDaoError::LoadRatings { team_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadRatings { team_id, source })?;

        documents
            .into_iter()
            .map(RatingHistoryEntity::try_from)
            .collect()
    }
}

/// Translate a [`MatchFilter`] into a MongoDB query document.
fn match_filter_document(filter: &MatchFilter) -> Document {
    let mut query = Document::new();
    if !filter.statuses.is_empty() {
        let statuses = filter
            .statuses
            .iter()
            .map(|status| status.as_str())
            .collect::<Vec<_>>();
        query.insert("status", doc! {"$in": statuses});
    }
    if let Some(team_id) = filter.team_id {
        let team_id = team_id.to_string();
        query.insert(
            "$or",
            vec![
                doc! {"team1_id": team_id.clone()},
                doc! {"team2_id": team_id},
            ],
        );
    }
    if let Some(table_id) = filter.table_id {
        query.insert("table_id", table_id.to_string());
    }
    query
}

impl MatchStore for MongoMatchStore {
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(doc_id(id)).await.map_err(Into::into) })
    }

    fn find_team_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(doc! {"name": name}).await.map_err(Into::into) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams().await.map_err(Into::into) })
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_team(team).await.map_err(Into::into) })
    }

    fn set_team_status(
        &self,
        ids: Vec<Uuid>,
        status: TeamStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.set_team_status(ids, status).await.map_err(Into::into) })
    }

    fn claim_available_team(
        &self,
        exclude: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.claim_available_team(exclude).await.map_err(Into::into) })
    }

    fn list_tables(&self) -> BoxFuture<'static, StorageResult<Vec<TableEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_tables().await.map_err(Into::into) })
    }

    fn save_table(&self, table: TableEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_table(table).await.map_err(Into::into) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches(filter).await.map_err(Into::into) })
    }

    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_match(entity).await.map_err(Into::into) })
    }

    fn upsert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_submission(submission).await.map_err(Into::into) })
    }

    fn list_submissions(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_submissions(match_id).await.map_err(Into::into) })
    }

    fn delete_submissions(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_submissions(match_id).await.map_err(Into::into) })
    }

    fn append_rating_history(
        &self,
        entry: RatingHistoryEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_rating_history(entry).await.map_err(Into::into) })
    }

    fn rating_history(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<RatingHistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.rating_history(team_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::Bson;

    use super::*;
    use crate::dao::models::MatchStatus;

    #[test]
    fn live_filter_for_team_uses_or_clause() {
        let team_id = Uuid::new_v4();
        let query = match_filter_document(&MatchFilter::live().for_team(team_id));

        let statuses = query.get_document("status").unwrap().get_array("$in").unwrap();
        assert_eq!(statuses.len(), MatchStatus::LIVE.len());
        let branches = query.get_array("$or").unwrap();
        assert_eq!(
            branches[0],
            Bson::Document(doc! {"team1_id": team_id.to_string()})
        );
        assert!(query.get("table_id").is_none());
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(match_filter_document(&MatchFilter::default()).is_empty());
    }
}

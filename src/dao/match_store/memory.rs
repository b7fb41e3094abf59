//! Process-local match store, used when no database is configured and by the test suites.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use rand::{rng, seq::IndexedRandom};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::MatchStore;
use crate::dao::{
    models::{
        MatchEntity, MatchFilter, RatingHistoryEntity, SubmissionEntity, TableEntity, TeamEntity,
        TeamStatus,
    },
    storage::StorageResult,
};

#[derive(Default)]
struct Ledger {
    teams: IndexMap<Uuid, TeamEntity>,
    tables: IndexMap<Uuid, TableEntity>,
    matches: IndexMap<Uuid, MatchEntity>,
    submissions: IndexMap<(Uuid, Uuid), SubmissionEntity>,
    rating_history: Vec<RatingHistoryEntity>,
}

/// [`MatchStore`] keeping every record in memory behind a single lock.
#[derive(Clone, Default)]
pub struct InMemoryMatchStore {
    inner: Arc<Mutex<Ledger>>,
}

impl InMemoryMatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for InMemoryMatchStore {
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.teams.get(&id).cloned()) })
    }

    fn find_team_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let ledger = inner.lock().await;
            Ok(ledger.teams.values().find(|team| team.name == name).cloned())
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.teams.values().cloned().collect()) })
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.lock().await.teams.insert(team.id, team);
            Ok(())
        })
    }

    fn set_team_status(
        &self,
        ids: Vec<Uuid>,
        status: TeamStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut ledger = inner.lock().await;
            for id in ids {
                if let Some(team) = ledger.teams.get_mut(&id) {
                    team.status = status;
                }
            }
            Ok(())
        })
    }

    fn claim_available_team(
        &self,
        exclude: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut ledger = inner.lock().await;
            let candidates = ledger
                .teams
                .values()
                .filter(|team| team.status == TeamStatus::Available && team.id != exclude)
                .map(|team| team.id)
                .collect::<Vec<_>>();

            let Some(&claimed) = candidates.choose(&mut rng()) else {
                return Ok(None);
            };

            let team = ledger.teams.get_mut(&claimed).map(|team| {
                team.status = TeamStatus::MatchPending;
                team.clone()
            });
            Ok(team)
        })
    }

    fn list_tables(&self) -> BoxFuture<'static, StorageResult<Vec<TableEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.tables.values().cloned().collect()) })
    }

    fn save_table(&self, table: TableEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.lock().await.tables.insert(table.id, table);
            Ok(())
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.matches.get(&id).cloned()) })
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let ledger = inner.lock().await;
            let mut matches = ledger
                .matches
                .values()
                .filter(|entity| filter.matches(entity))
                .cloned()
                .collect::<Vec<_>>();
            // Stable sort keeps insertion order among equal keys.
            matches.sort_by_key(|entity| (entity.scheduled_start, entity.created_at));
            Ok(matches)
        })
    }

    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.lock().await.matches.insert(entity.id, entity);
            Ok(())
        })
    }

    fn upsert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let key = (submission.match_id, submission.team_id);
            inner.lock().await.submissions.insert(key, submission);
            Ok(())
        })
    }

    fn list_submissions(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let ledger = inner.lock().await;
            Ok(ledger
                .submissions
                .values()
                .filter(|submission| submission.match_id == match_id)
                .cloned()
                .collect())
        })
    }

    fn delete_submissions(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .lock()
                .await
                .submissions
                .retain(|(submission_match, _), _| *submission_match != match_id);
            Ok(())
        })
    }

    fn append_rating_history(
        &self,
        entry: RatingHistoryEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.lock().await.rating_history.push(entry);
            Ok(())
        })
    }

    fn rating_history(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<RatingHistoryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let ledger = inner.lock().await;
            Ok(ledger
                .rating_history
                .iter()
                .filter(|entry| entry.team_id == team_id)
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use time::macros::datetime;

    use super::*;
    use crate::dao::models::MatchStatus;

    fn team(name: &str, status: TeamStatus) -> TeamEntity {
        let mut team = TeamEntity::new(name.into(), 1000, datetime!(2025-01-01 12:00 UTC));
        team.status = status;
        team
    }

    #[tokio::test]
    async fn claim_skips_requester_and_busy_teams() {
        let store = InMemoryMatchStore::new();
        let requester = team("requester", TeamStatus::Available);
        let busy = team("busy", TeamStatus::MatchActive);
        let idle = team("idle", TeamStatus::NoMatch);
        for entity in [&requester, &busy, &idle] {
            store.save_team(entity.clone()).await.unwrap();
        }

        let claimed = store.claim_available_team(requester.id).await.unwrap();
        assert!(claimed.is_none());
    }

    #[tokio::test]
    async fn concurrent_claims_never_return_the_same_team() {
        let store = InMemoryMatchStore::new();
        let mut ids = Vec::new();
        for index in 0..6 {
            let entity = team(&format!("team-{index}"), TeamStatus::Available);
            ids.push(entity.id);
            store.save_team(entity).await.unwrap();
        }

        let requester = Uuid::new_v4();
        let handles = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.claim_available_team(requester).await })
            })
            .collect::<Vec<_>>();

        let mut claimed = HashSet::new();
        for handle in handles {
            if let Some(team) = handle.await.unwrap().unwrap() {
                assert!(claimed.insert(team.id), "team claimed twice");
                assert_eq!(team.status, TeamStatus::MatchPending);
            }
        }
        assert_eq!(claimed.len(), ids.len());
    }

    #[tokio::test]
    async fn submissions_are_keyed_by_match_and_team() {
        let store = InMemoryMatchStore::new();
        let match_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        let at = datetime!(2025-01-01 12:00 UTC);

        for (score_for, score_against) in [(3, 5), (10, 5)] {
            store
                .upsert_submission(SubmissionEntity {
                    match_id,
                    team_id,
                    score_for,
                    score_against,
                    submitted_at: at,
                })
                .await
                .unwrap();
        }

        let submissions = store.list_submissions(match_id).await.unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].score_for, 10);

        store.delete_submissions(match_id).await.unwrap();
        assert!(store.list_submissions(match_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_matches_orders_by_schedule() {
        let store = InMemoryMatchStore::new();
        let table = Uuid::new_v4();
        let created = datetime!(2025-01-01 12:00 UTC);
        let late = MatchEntity::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            table,
            datetime!(2025-01-01 12:30 UTC),
            created,
        );
        let early = MatchEntity::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            table,
            datetime!(2025-01-01 12:15 UTC),
            created,
        );
        let mut done = early.clone();
        done.id = Uuid::new_v4();
        done.status = MatchStatus::Completed;

        for entity in [&late, &early, &done] {
            store.save_match(entity.clone()).await.unwrap();
        }

        let live = store.list_matches(MatchFilter::live()).await.unwrap();
        assert_eq!(
            live.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![early.id, late.id]
        );
    }
}

//! Read-side projections. Every read first advances deadlines and heals team statuses, so a
//! caller never observes a state the engine would immediately correct.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{MatchEntity, MatchFilter, MatchStatus, TeamEntity},
    },
    dto::{
        format_timestamp,
        matches::MatchSnapshot,
        public::{LeaderboardEntry, RatingPoint, ScheduledMatch, TableSchedule, TeamProfile},
        team::TeamStateResponse,
    },
    error::ServiceError,
    services::deadline,
    state::{SharedState, lifecycle},
};

/// Load a team or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_team(
    store: &dyn MatchStore,
    team_id: Uuid,
) -> Result<TeamEntity, ServiceError> {
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
}

/// Load a match or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_match(
    store: &dyn MatchStore,
    match_id: Uuid,
) -> Result<MatchEntity, ServiceError> {
    store
        .find_match(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` not found")))
}

/// Earliest live match of a team.
pub(crate) async fn current_match(
    store: &dyn MatchStore,
    team_id: Uuid,
) -> Result<Option<MatchEntity>, ServiceError> {
    let live = store
        .list_matches(MatchFilter::live().for_team(team_id))
        .await?;
    Ok(live.into_iter().next())
}

/// Bring the stored team status in line with its live matches and return the healed team.
pub(crate) async fn reconcile_team(
    store: &dyn MatchStore,
    team_id: Uuid,
) -> Result<TeamEntity, ServiceError> {
    let mut team = load_team(store, team_id).await?;
    let live = current_match(store, team_id).await?;
    let expected = lifecycle::expected_team_status(team.status, live.map(|m| m.status));
    if expected != team.status {
        debug!(
            team_id = %team.id,
            from = team.status.as_str(),
            to = expected.as_str(),
            "healing inconsistent team status"
        );
        store.set_team_status(vec![team.id], expected).await?;
        team.status = expected;
    }
    Ok(team)
}

/// Build the public view of `entity` from the store.
pub(crate) async fn snapshot(
    store: &dyn MatchStore,
    entity: &MatchEntity,
) -> Result<MatchSnapshot, ServiceError> {
    let team1 = store.find_team(entity.team1_id).await?;
    let team2 = store.find_team(entity.team2_id).await?;
    let tables = store.list_tables().await?;
    let table = tables.iter().find(|table| table.id == entity.table_id);
    let submissions = store.list_submissions(entity.id).await?;

    Ok(MatchSnapshot::build(
        entity,
        team1.as_ref(),
        team2.as_ref(),
        table,
        &submissions,
    ))
}

/// Status of the acting team and its earliest live match.
pub async fn get_state(
    state: &SharedState,
    team_id: Uuid,
) -> Result<TeamStateResponse, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let team = reconcile_team(store, team_id).await?;
            let current_match = match current_match(store, team_id).await? {
                Some(entity) => Some(snapshot(store, &entity).await?),
                None => None,
            };

            Ok(TeamStateResponse {
                team_id: team.id,
                name: team.name,
                status: team.status,
                rating: team.rating,
                current_match,
            })
        })
        .await
}

/// Snapshot of any match.
pub async fn get_match_details(
    state: &SharedState,
    match_id: Uuid,
) -> Result<MatchSnapshot, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let entity = load_match(store, match_id).await?;
            snapshot(store, &entity).await
        })
        .await
}

/// Percentage of completed matches won, rounded to one decimal.
fn win_rate(team: &TeamEntity) -> f64 {
    if team.plays == 0 {
        return 0.0;
    }
    (f64::from(team.wins) * 1000.0 / f64::from(team.plays)).round() / 10.0
}

/// Teams ordered by rating, highest first; equal ratings are ordered by name.
pub async fn get_leaderboard(state: &SharedState) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    state
        .run_exclusive(|store, _now| async move {
            let mut teams = store.list_teams().await?;
            teams.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
            Ok(teams
                .into_iter()
                .enumerate()
                .map(|(index, team)| LeaderboardEntry {
                    rank: index as u32 + 1,
                    team_id: team.id,
                    name: team.name,
                    rating: team.rating,
                    plays: team.plays,
                    wins: team.wins,
                    losses: team.losses,
                })
                .collect())
        })
        .await
}

/// Per table: the match holding it and the pending queue.
pub async fn get_schedule(state: &SharedState) -> Result<Vec<TableSchedule>, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let tables = store.list_tables().await?;
            let names: HashMap<Uuid, String> = store
                .list_teams()
                .await?
                .into_iter()
                .map(|team| (team.id, team.name))
                .collect();
            let live = store.list_matches(MatchFilter::live()).await?;

            let view = |entity: &MatchEntity| ScheduledMatch {
                match_id: entity.id,
                status: entity.status,
                scheduled_start: format_timestamp(entity.scheduled_start),
                team1_name: names.get(&entity.team1_id).cloned().unwrap_or_default(),
                team2_name: names.get(&entity.team2_id).cloned().unwrap_or_default(),
            };

            Ok(tables
                .into_iter()
                .map(|table| {
                    let on_table = live.iter().filter(|entity| entity.table_id == table.id);
                    let current = on_table
                        .clone()
                        .find(|entity| entity.status.occupies_table())
                        .map(view);
                    let queue = on_table
                        .filter(|entity| entity.status == MatchStatus::Pending)
                        .map(view)
                        .collect();
                    TableSchedule {
                        table_id: table.id,
                        table_name: table.name,
                        current,
                        queue,
                    }
                })
                .collect())
        })
        .await
}

/// Public profile with derived statistics and the rating trajectory.
pub async fn get_team_profile(
    state: &SharedState,
    team_id: Uuid,
) -> Result<TeamProfile, ServiceError> {
    let timing = state.config().timing;
    let initial_rating = state.config().rating.initial_rating;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let team = reconcile_team(store, team_id).await?;

            let mut rating_history = vec![RatingPoint {
                rating: initial_rating,
                recorded_at: format_timestamp(team.created_at),
            }];
            rating_history.extend(store.rating_history(team_id).await?.into_iter().map(
                |entry| RatingPoint {
                    rating: entry.rating,
                    recorded_at: format_timestamp(entry.recorded_at),
                },
            ));

            Ok(TeamProfile {
                win_rate: win_rate(&team),
                team_id: team.id,
                name: team.name,
                status: team.status,
                rating: team.rating,
                plays: team.plays,
                wins: team.wins,
                losses: team.losses,
                rating_history,
            })
        })
        .await
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::dao::{match_store::InMemoryMatchStore, models::TeamStatus};

    #[test]
    fn win_rate_keeps_one_decimal() {
        let mut team = TeamEntity::new("Spin".into(), 1000, datetime!(2025-05-10 20:00 UTC));
        assert_eq!(win_rate(&team), 0.0);

        team.plays = 3;
        team.wins = 2;
        team.losses = 1;
        assert_eq!(win_rate(&team), 66.7);
    }

    #[tokio::test]
    async fn reconcile_releases_team_without_live_match() {
        let store = InMemoryMatchStore::new();
        let team = TeamEntity::new("Ghost".into(), 1000, datetime!(2025-05-10 20:00 UTC));
        store.save_team(team.clone()).await.unwrap();
        store
            .set_team_status(vec![team.id], TeamStatus::MatchActive)
            .await
            .unwrap();

        let healed = reconcile_team(&store, team.id).await.unwrap();
        assert_eq!(healed.status, TeamStatus::NoMatch);
        assert_eq!(
            store.find_team(team.id).await.unwrap().unwrap().status,
            TeamStatus::NoMatch
        );
    }

    #[tokio::test]
    async fn reconcile_reserves_idle_team_with_live_match() {
        let at = datetime!(2025-05-10 20:00 UTC);
        let store = InMemoryMatchStore::new();
        let home = TeamEntity::new("Home".into(), 1000, at);
        let away = TeamEntity::new("Away".into(), 1000, at);
        store.save_team(home.clone()).await.unwrap();
        store.save_team(away.clone()).await.unwrap();
        store
            .save_match(MatchEntity::pending(home.id, away.id, Uuid::new_v4(), at, at))
            .await
            .unwrap();

        let healed = reconcile_team(&store, home.id).await.unwrap();
        assert_eq!(healed.status, TeamStatus::MatchPending);
    }
}

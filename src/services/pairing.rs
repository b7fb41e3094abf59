//! Opponent pairing and the availability toggle.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::MatchTiming,
    dao::{
        match_store::MatchStore,
        models::{MatchEntity, MatchFilter, TableEntity, TeamEntity, TeamStatus},
    },
    dto::team::{ToggleOutcome, ToggleResponse},
    error::ServiceError,
    services::{deadline, query_service},
    state::SharedState,
};

/// Start of the next free slot on `table`.
///
/// The slot follows the latest live match queued on the table; an idle table is free now.
async fn next_slot(
    store: &dyn MatchStore,
    table: &TableEntity,
    now: OffsetDateTime,
    timing: &MatchTiming,
) -> Result<OffsetDateTime, ServiceError> {
    let queued = store
        .list_matches(MatchFilter::live().on_table(table.id))
        .await?;
    Ok(queued
        .iter()
        .map(|entity| entity.scheduled_start)
        .max()
        .map(|latest| latest + timing.match_duration + timing.buffer)
        .unwrap_or(now))
}

/// Reserve `requester` and schedule its match against the already claimed `opponent`.
async fn schedule_match(
    store: &dyn MatchStore,
    requester: &TeamEntity,
    opponent: &TeamEntity,
    table: &TableEntity,
    now: OffsetDateTime,
    timing: &MatchTiming,
) -> Result<MatchEntity, ServiceError> {
    store
        .set_team_status(vec![requester.id], TeamStatus::MatchPending)
        .await?;
    let scheduled_start = next_slot(store, table, now, timing).await?;
    let entity = MatchEntity::pending(requester.id, opponent.id, table.id, scheduled_start, now);
    store.save_match(entity.clone()).await?;
    Ok(entity)
}

/// Pair `requester` with a searching team, inside an exclusive section.
///
/// Returns `None` without side effects when no opponent is searching.
pub(crate) async fn create_match_for(
    store: &dyn MatchStore,
    requester: &TeamEntity,
    now: OffsetDateTime,
    timing: &MatchTiming,
) -> Result<Option<Uuid>, ServiceError> {
    if requester.status != TeamStatus::NoMatch {
        return Err(ServiceError::InvalidState(format!(
            "team `{}` cannot look for a match while {}",
            requester.id,
            requester.status.as_str()
        )));
    }

    let Some(table) = store.list_tables().await?.into_iter().next() else {
        return Err(ServiceError::InvalidState("no table is configured".into()));
    };

    let Some(opponent) = store.claim_available_team(requester.id).await? else {
        return Ok(None);
    };

    match schedule_match(store, requester, &opponent, &table, now, timing).await {
        Ok(entity) => {
            info!(
                match_id = %entity.id,
                team1 = %requester.id,
                team2 = %opponent.id,
                table = %table.id,
                "match scheduled"
            );
            Ok(Some(entity.id))
        }
        Err(err) => {
            warn!(
                team_id = %requester.id,
                opponent_id = %opponent.id,
                error = %err,
                "failed to schedule match; releasing claimed teams"
            );
            if let Err(release_err) = store
                .set_team_status(vec![opponent.id], TeamStatus::Available)
                .await
            {
                warn!(team_id = %opponent.id, error = %release_err, "failed to release opponent");
            }
            if let Err(release_err) = store
                .set_team_status(vec![requester.id], requester.status)
                .await
            {
                warn!(team_id = %requester.id, error = %release_err, "failed to release requester");
            }
            Err(err)
        }
    }
}

/// Try to pair an idle team with a searching one.
pub async fn try_create_match(
    state: &SharedState,
    team_id: Uuid,
) -> Result<Option<Uuid>, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let requester = query_service::reconcile_team(store, team_id).await?;
            create_match_for(store, &requester, now, &timing).await
        })
        .await
}

/// Flip a team between idle and searching, pairing it immediately when an opponent waits.
pub async fn toggle_availability(
    state: &SharedState,
    team_id: Uuid,
) -> Result<ToggleResponse, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let team = query_service::reconcile_team(store, team_id).await?;

            match team.status {
                TeamStatus::MatchPending | TeamStatus::MatchActive => Err(
                    ServiceError::InvalidState(format!("team `{team_id}` is already in a match")),
                ),
                TeamStatus::Available => {
                    store
                        .set_team_status(vec![team_id], TeamStatus::NoMatch)
                        .await?;
                    Ok(ToggleResponse {
                        outcome: ToggleOutcome::Cancelled,
                        status: TeamStatus::NoMatch,
                        match_id: None,
                    })
                }
                TeamStatus::NoMatch => match create_match_for(store, &team, now, &timing).await? {
                    Some(match_id) => Ok(ToggleResponse {
                        outcome: ToggleOutcome::MatchFound,
                        status: TeamStatus::MatchPending,
                        match_id: Some(match_id),
                    }),
                    None => {
                        store
                            .set_team_status(vec![team_id], TeamStatus::Available)
                            .await?;
                        Ok(ToggleResponse {
                            outcome: ToggleOutcome::Searching,
                            status: TeamStatus::Available,
                            match_id: None,
                        })
                    }
                },
            }
        })
        .await
}

//! Team actions that drive a match from its ready check to the end of play.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, MatchStatus, Side, TeamStatus},
    dto::matches::MatchSnapshot,
    error::ServiceError,
    services::{deadline, query_service},
    state::{
        SharedState,
        lifecycle::{self, MatchEvent},
    },
};

/// Side played by `team_id`, or [`ServiceError::Unauthorized`] for outsiders.
pub(crate) fn participant_side(entity: &MatchEntity, team_id: Uuid) -> Result<Side, ServiceError> {
    entity.side_of(team_id).ok_or_else(|| {
        ServiceError::Unauthorized(format!(
            "team `{team_id}` does not play match `{}`",
            entity.id
        ))
    })
}

/// Confirm presence at the table.
///
/// Idempotent. Once both teams are ready during the ready check the clock starts and both
/// teams move to `match_active`. Readiness given while the match is still pending is kept and
/// starts the match as soon as its ready check opens.
pub async fn set_ready(
    state: &SharedState,
    match_id: Uuid,
    team_id: Uuid,
) -> Result<MatchSnapshot, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let mut entity = query_service::load_match(store, match_id).await?;
            let side = participant_side(&entity, team_id)?;

            if matches!(entity.status, MatchStatus::Pending | MatchStatus::ReadyCheck) {
                let flag = match side {
                    Side::Team1 => &mut entity.team1_ready,
                    Side::Team2 => &mut entity.team2_ready,
                };
                if !*flag {
                    *flag = true;
                    let starts = entity.status == MatchStatus::ReadyCheck && entity.both_ready();
                    if starts {
                        lifecycle::apply(&mut entity, MatchEvent::BothReady, now)?;
                    }
                    store.save_match(entity.clone()).await?;
                    if starts {
                        store
                            .set_team_status(entity.team_ids().to_vec(), TeamStatus::MatchActive)
                            .await?;
                        info!(match_id = %entity.id, "both teams ready; match started");
                    }
                }
            }

            query_service::snapshot(store, &entity).await
        })
        .await
}

/// Report the match as played.
///
/// Idempotent. Both flags move the match to `finished`; teams stay `match_active` until the
/// scores are reconciled.
pub async fn set_done(
    state: &SharedState,
    match_id: Uuid,
    team_id: Uuid,
) -> Result<MatchSnapshot, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let mut entity = query_service::load_match(store, match_id).await?;
            let side = participant_side(&entity, team_id)?;

            match entity.status {
                MatchStatus::Pending | MatchStatus::ReadyCheck => {
                    return Err(ServiceError::InvalidState(format!(
                        "match `{match_id}` has not started"
                    )));
                }
                MatchStatus::Active => {
                    let flag = match side {
                        Side::Team1 => &mut entity.team1_done,
                        Side::Team2 => &mut entity.team2_done,
                    };
                    if !*flag {
                        *flag = true;
                        if entity.both_done() {
                            lifecycle::apply(&mut entity, MatchEvent::BothDone, now)?;
                            info!(match_id = %entity.id, "match finished; waiting for scores");
                        }
                        store.save_match(entity.clone()).await?;
                    }
                }
                MatchStatus::Finished | MatchStatus::Completed => {}
            }

            query_service::snapshot(store, &entity).await
        })
        .await
}

//! Wall-clock driven transitions: opening ready checks and forcing stalled matches to start.

use std::collections::HashSet;

use indexmap::IndexMap;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::MatchTiming,
    dao::{
        match_store::MatchStore,
        models::{MatchEntity, MatchFilter, MatchStatus},
    },
    error::ServiceError,
    state::lifecycle::{self, MatchEvent},
};

/// Transition that must be applied to a match at the evaluated instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTransition {
    pub match_id: Uuid,
    pub event: MatchEvent,
}

/// Compute the transitions due at `now` for the given live matches.
///
/// Pending matches are visited in schedule order; a ready check opened earlier in the pass
/// holds its table for the candidates that follow. Matches whose ready check opens in this pass
/// are eligible for the forced start in the same pass.
pub fn evaluate(
    now: OffsetDateTime,
    matches: &[MatchEntity],
    timing: &MatchTiming,
) -> Vec<DueTransition> {
    let mut due = Vec::new();
    let mut busy_tables: HashSet<Uuid> = matches
        .iter()
        .filter(|entity| entity.status.occupies_table())
        .map(|entity| entity.table_id)
        .collect();

    let mut pending: Vec<&MatchEntity> = matches
        .iter()
        .filter(|entity| entity.status == MatchStatus::Pending)
        .collect();
    pending.sort_by_key(|entity| (entity.scheduled_start, entity.created_at));

    let mut opened = Vec::new();
    for entity in pending {
        if now < entity.scheduled_start - timing.ready_window {
            continue;
        }
        if !busy_tables.insert(entity.table_id) {
            continue;
        }
        due.push(DueTransition {
            match_id: entity.id,
            event: MatchEvent::OpenReadyCheck,
        });
        opened.push(entity);
    }

    let in_ready_check = matches
        .iter()
        .filter(|entity| entity.status == MatchStatus::ReadyCheck)
        .chain(opened);
    for entity in in_ready_check {
        let event = if entity.both_ready() {
            MatchEvent::BothReady
        } else if now > entity.scheduled_start + timing.ready_timeout {
            MatchEvent::ForceStart
        } else {
            continue;
        };
        due.push(DueTransition {
            match_id: entity.id,
            event,
        });
    }

    due
}

/// Run the evaluator against the store and persist every due transition.
///
/// Both participants of a started match are mirrored to `match_active`. Returns the matches
/// that changed.
pub async fn advance(
    store: &dyn MatchStore,
    now: OffsetDateTime,
    timing: &MatchTiming,
) -> Result<Vec<MatchEntity>, ServiceError> {
    let live = store.list_matches(MatchFilter::live()).await?;
    let due = evaluate(now, &live, timing);
    if due.is_empty() {
        return Ok(Vec::new());
    }

    let mut touched: IndexMap<Uuid, MatchEntity> = IndexMap::new();
    for transition in due {
        let Some(source) = live.iter().find(|m| m.id == transition.match_id) else {
            continue;
        };
        let entity = touched
            .entry(source.id)
            .or_insert_with(|| source.clone());

        let from = entity.status;
        let to = lifecycle::apply(entity, transition.event, now)?;
        match transition.event {
            MatchEvent::ForceStart => info!(
                match_id = %entity.id,
                "ready check timed out; starting match"
            ),
            _ => debug!(
                match_id = %entity.id,
                from = from.as_str(),
                to = to.as_str(),
                "deadline transition"
            ),
        }
    }

    let mut changed = Vec::with_capacity(touched.len());
    for (_, entity) in touched {
        store.save_match(entity.clone()).await?;
        store
            .set_team_status(
                entity.team_ids().to_vec(),
                lifecycle::team_status_for(entity.status),
            )
            .await?;
        changed.push(entity);
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use time::{Duration, macros::datetime};

    use super::*;
    use crate::dao::{
        match_store::InMemoryMatchStore,
        models::{TeamEntity, TeamStatus},
    };

    const START: OffsetDateTime = datetime!(2025-05-10 20:00 UTC);

    fn scheduled(table: Uuid, at: OffsetDateTime) -> MatchEntity {
        MatchEntity::pending(Uuid::new_v4(), Uuid::new_v4(), table, at, START)
    }

    fn events(due: &[DueTransition], id: Uuid) -> Vec<MatchEvent> {
        due.iter()
            .filter(|t| t.match_id == id)
            .map(|t| t.event)
            .collect()
    }

    #[test]
    fn opens_ready_check_inside_window_only() {
        let table = Uuid::new_v4();
        let entity = scheduled(table, START + Duration::minutes(10));
        let timing = MatchTiming::default();

        assert!(evaluate(START + Duration::minutes(6), &[entity.clone()], &timing).is_empty());
        assert_eq!(
            events(
                &evaluate(START + Duration::minutes(7), &[entity.clone()], &timing),
                entity.id
            ),
            vec![MatchEvent::OpenReadyCheck]
        );
    }

    #[test]
    fn only_one_match_per_table_is_promoted() {
        let table = Uuid::new_v4();
        let first = scheduled(table, START);
        let second = scheduled(table, START + Duration::minutes(1));
        let elsewhere = scheduled(Uuid::new_v4(), START + Duration::minutes(1));

        let due = evaluate(
            START,
            &[second.clone(), first.clone(), elsewhere.clone()],
            &MatchTiming::default(),
        );
        assert_eq!(events(&due, first.id), vec![MatchEvent::OpenReadyCheck]);
        assert!(events(&due, second.id).is_empty());
        assert_eq!(events(&due, elsewhere.id), vec![MatchEvent::OpenReadyCheck]);
    }

    #[test]
    fn occupied_table_blocks_promotion() {
        let table = Uuid::new_v4();
        let mut running = scheduled(table, START - Duration::minutes(15));
        running.status = MatchStatus::Active;
        running.timer_start = Some(START - Duration::minutes(14));
        let next = scheduled(table, START);

        let due = evaluate(START, &[running, next.clone()], &MatchTiming::default());
        assert!(events(&due, next.id).is_empty());
    }

    #[test]
    fn late_ready_check_is_forced_to_start() {
        let table = Uuid::new_v4();
        let mut entity = scheduled(table, START);
        entity.status = MatchStatus::ReadyCheck;
        entity.team1_ready = true;
        let timing = MatchTiming::default();

        assert!(evaluate(START + Duration::minutes(5), &[entity.clone()], &timing).is_empty());
        assert_eq!(
            events(
                &evaluate(START + Duration::minutes(5) + Duration::seconds(1), &[entity.clone()], &timing),
                entity.id
            ),
            vec![MatchEvent::ForceStart]
        );
    }

    #[test]
    fn promotion_and_forced_start_in_one_pass() {
        let entity = scheduled(Uuid::new_v4(), START);
        let due = evaluate(
            START + Duration::minutes(8),
            &[entity.clone()],
            &MatchTiming::default(),
        );
        assert_eq!(
            events(&due, entity.id),
            vec![MatchEvent::OpenReadyCheck, MatchEvent::ForceStart]
        );
    }

    #[test]
    fn readiness_confirmed_while_pending_starts_on_promotion() {
        let mut entity = scheduled(Uuid::new_v4(), START);
        entity.team1_ready = true;
        entity.team2_ready = true;
        let due = evaluate(START, &[entity.clone()], &MatchTiming::default());
        assert_eq!(
            events(&due, entity.id),
            vec![MatchEvent::OpenReadyCheck, MatchEvent::BothReady]
        );
    }

    #[tokio::test]
    async fn advance_persists_transitions_and_mirrors_teams() {
        let store = InMemoryMatchStore::new();
        let home = TeamEntity::new("Home".into(), 1000, START);
        let away = TeamEntity::new("Away".into(), 1000, START);
        store.save_team(home.clone()).await.unwrap();
        store.save_team(away.clone()).await.unwrap();
        store
            .set_team_status(vec![home.id, away.id], TeamStatus::MatchPending)
            .await
            .unwrap();
        let entity = MatchEntity::pending(home.id, away.id, Uuid::new_v4(), START, START);
        store.save_match(entity.clone()).await.unwrap();

        let now = START + Duration::minutes(6);
        let changed = advance(&store, now, &MatchTiming::default())
            .await
            .unwrap();
        assert_eq!(changed.len(), 1);

        let stored = store.find_match(entity.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Active);
        assert_eq!(stored.timer_start, Some(now));
        for id in [home.id, away.id] {
            let team = store.find_team(id).await.unwrap().unwrap();
            assert_eq!(team.status, TeamStatus::MatchActive);
        }

        assert!(
            advance(&store, now, &MatchTiming::default())
                .await
                .unwrap()
                .is_empty()
        );
    }
}

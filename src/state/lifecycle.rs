use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::{MatchEntity, MatchStatus, TeamStatus};

/// Events that move a match through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// The scheduled slot is near and the table is free.
    OpenReadyCheck,
    /// Both teams confirmed presence.
    BothReady,
    /// The ready check timed out; the clock starts anyway.
    ForceStart,
    /// Both teams reported the match as played.
    BothDone,
    /// Both score submissions agreed.
    ScoresReconciled,
}

/// Error returned when an event cannot be applied from the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// Status the match was in when the event was received.
    pub from: MatchStatus,
    /// The rejected event.
    pub event: MatchEvent,
}

/// Compute the status reached by applying `event` in `from`.
pub fn next_status(from: MatchStatus, event: MatchEvent) -> Result<MatchStatus, InvalidTransition> {
    let next = match (from, event) {
        (MatchStatus::Pending, MatchEvent::OpenReadyCheck) => MatchStatus::ReadyCheck,
        (MatchStatus::ReadyCheck, MatchEvent::BothReady | MatchEvent::ForceStart) => {
            MatchStatus::Active
        }
        (MatchStatus::Active, MatchEvent::BothDone) => MatchStatus::Finished,
        (MatchStatus::Active | MatchStatus::Finished, MatchEvent::ScoresReconciled) => {
            MatchStatus::Completed
        }
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

/// Apply `event` to `entity`, stamping the match clock when the match starts.
pub fn apply(
    entity: &mut MatchEntity,
    event: MatchEvent,
    now: OffsetDateTime,
) -> Result<MatchStatus, InvalidTransition> {
    let next = next_status(entity.status, event)?;
    if next == MatchStatus::Active && entity.timer_start.is_none() {
        entity.timer_start = Some(now);
    }
    entity.status = next;
    Ok(next)
}

/// Team status mirroring a live match status.
pub fn team_status_for(status: MatchStatus) -> TeamStatus {
    match status {
        MatchStatus::Pending | MatchStatus::ReadyCheck => TeamStatus::MatchPending,
        MatchStatus::Active | MatchStatus::Finished => TeamStatus::MatchActive,
        MatchStatus::Completed => TeamStatus::NoMatch,
    }
}

/// Status a team must have given its stored status and the status of its earliest live match.
///
/// Idle teams keep their idle flavour (searching or not); a team without a live match can never
/// look reserved.
pub fn expected_team_status(current: TeamStatus, live: Option<MatchStatus>) -> TeamStatus {
    match live {
        Some(status) if status.is_live() => team_status_for(status),
        _ if current.in_match() => TeamStatus::NoMatch,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;

    fn pending() -> MatchEntity {
        MatchEntity::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            datetime!(2025-05-10 20:00 UTC),
            datetime!(2025-05-10 19:45 UTC),
        )
    }

    #[test]
    fn full_happy_path_through_match() {
        let now = datetime!(2025-05-10 20:01 UTC);
        let mut entity = pending();

        assert_eq!(
            apply(&mut entity, MatchEvent::OpenReadyCheck, now),
            Ok(MatchStatus::ReadyCheck)
        );
        assert_eq!(
            apply(&mut entity, MatchEvent::BothReady, now),
            Ok(MatchStatus::Active)
        );
        assert_eq!(entity.timer_start, Some(now));
        assert_eq!(
            apply(&mut entity, MatchEvent::BothDone, now),
            Ok(MatchStatus::Finished)
        );
        assert_eq!(
            apply(&mut entity, MatchEvent::ScoresReconciled, now),
            Ok(MatchStatus::Completed)
        );
    }

    #[test]
    fn pending_match_cannot_start_before_ready_check() {
        let err = next_status(MatchStatus::Pending, MatchEvent::BothReady).unwrap_err();
        assert_eq!(err.from, MatchStatus::Pending);
        assert_eq!(err.event, MatchEvent::BothReady);
    }

    #[test]
    fn completed_is_terminal() {
        for event in [
            MatchEvent::OpenReadyCheck,
            MatchEvent::BothReady,
            MatchEvent::ForceStart,
            MatchEvent::BothDone,
            MatchEvent::ScoresReconciled,
        ] {
            assert!(next_status(MatchStatus::Completed, event).is_err());
        }
    }

    #[test]
    fn forced_start_keeps_existing_timer() {
        let mut entity = pending();
        entity.status = MatchStatus::ReadyCheck;
        entity.timer_start = Some(datetime!(2025-05-10 20:02 UTC));

        apply(
            &mut entity,
            MatchEvent::ForceStart,
            datetime!(2025-05-10 20:06 UTC),
        )
        .unwrap();
        assert_eq!(entity.timer_start, Some(datetime!(2025-05-10 20:02 UTC)));
    }

    #[test]
    fn team_status_heals_in_both_directions() {
        assert_eq!(
            expected_team_status(TeamStatus::MatchActive, None),
            TeamStatus::NoMatch
        );
        assert_eq!(
            expected_team_status(TeamStatus::Available, None),
            TeamStatus::Available
        );
        assert_eq!(
            expected_team_status(TeamStatus::NoMatch, Some(MatchStatus::Finished)),
            TeamStatus::MatchActive
        );
        assert_eq!(
            expected_team_status(TeamStatus::MatchActive, Some(MatchStatus::ReadyCheck)),
            TeamStatus::MatchPending
        );
    }
}

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{MatchFilter, MatchStatus},
    dto::{format_timestamp, team::NotificationResponse},
    error::ServiceError,
    services::{deadline, query_service},
    state::SharedState,
};

/// Announce the team's next match once it is a few minutes away.
///
/// The first pending, not yet announced match whose start falls inside the notice window is
/// latched so it is reported exactly once.
///
/// Deadlines are advanced first. On a free table a match starting exactly at the window start
/// has already moved to its ready check, so that bound is only reached while the table is busy.
pub async fn check_notification(
    state: &SharedState,
    team_id: Uuid,
) -> Result<NotificationResponse, ServiceError> {
    let timing = state.config().timing;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            query_service::load_team(store, team_id).await?;

            let window_start = now + timing.notify_window_start;
            let window_end = now + timing.notify_window_end;
            let pending = store
                .list_matches(
                    MatchFilter::default()
                        .for_team(team_id)
                        .with_statuses(&[MatchStatus::Pending]),
                )
                .await?;

            let Some(mut entity) = pending.into_iter().find(|entity| {
                !entity.notification_sent
                    && entity.scheduled_start >= window_start
                    && entity.scheduled_start <= window_end
            }) else {
                return Ok(NotificationResponse::silent());
            };

            entity.notification_sent = true;
            store.save_match(entity.clone()).await?;
            let minutes_until = (entity.scheduled_start - now).whole_minutes();
            info!(
                match_id = %entity.id,
                team_id = %team_id,
                minutes_until,
                "upcoming match notice"
            );

            Ok(NotificationResponse {
                notify: true,
                match_id: Some(entity.id),
                minutes_until: Some(minutes_until),
                scheduled_time: Some(format_timestamp(entity.scheduled_start)),
            })
        })
        .await
}

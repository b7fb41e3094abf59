//! Dual-submission score reconciliation.
//!
//! Each team reports the score from its own side. The match is final only when the two reports
//! mirror each other; disagreeing reports are kept and flagged until one team resets them.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::RatingConfig,
    dao::{
        match_store::MatchStore,
        models::{MatchEntity, MatchStatus, RatingHistoryEntity, SubmissionEntity, TeamStatus},
    },
    dto::matches::{MAX_SCORE, MatchSnapshot, ScoreOutcome, ScoreResponse},
    error::ServiceError,
    services::{deadline, lifecycle_service::participant_side, query_service, rating},
    state::{
        SharedState,
        lifecycle::{self, MatchEvent},
    },
};

/// Whether two claims describe the same result from opposite sides.
pub fn claims_agree(a: &SubmissionEntity, b: &SubmissionEntity) -> bool {
    a.score_for == b.score_against && a.score_against == b.score_for
}

/// Close the match with the agreed scores, update both teams and record their new ratings.
async fn finalise(
    store: &dyn MatchStore,
    entity: &mut MatchEntity,
    team1_claim: &SubmissionEntity,
    now: OffsetDateTime,
    config: &RatingConfig,
) -> Result<(), ServiceError> {
    let mut team1 = query_service::load_team(store, entity.team1_id).await?;
    let mut team2 = query_service::load_team(store, entity.team2_id).await?;

    let (score1, score2) = (team1_claim.score_for, team1_claim.score_against);
    let team1_won = score1 > score2;

    lifecycle::apply(entity, MatchEvent::ScoresReconciled, now)?;
    entity.score1 = Some(score1);
    entity.score2 = Some(score2);
    entity.end_time = Some(now);
    entity.mismatch = false;

    let (winner, loser) = if team1_won {
        (&mut team1, &mut team2)
    } else {
        (&mut team2, &mut team1)
    };
    let winner_id = winner.id;
    entity.winner_id = Some(winner_id);
    let (winner_rating, loser_rating) = rating::rate(winner.rating, loser.rating, config);
    winner.rating = winner_rating;
    winner.wins += 1;
    loser.rating = loser_rating;
    loser.losses += 1;

    for team in [&mut team1, &mut team2] {
        team.plays += 1;
        team.status = TeamStatus::NoMatch;
    }

    store.save_match(entity.clone()).await?;
    for team in [team1, team2] {
        store
            .append_rating_history(RatingHistoryEntity {
                team_id: team.id,
                rating: team.rating,
                recorded_at: now,
            })
            .await?;
        store.save_team(team).await?;
    }

    info!(
        match_id = %entity.id,
        score1,
        score2,
        winner_id = %winner_id,
        "match completed"
    );
    Ok(())
}

/// File a score claim from `team_id`'s side and reconcile it with the opponent's claim.
pub async fn submit_score(
    state: &SharedState,
    match_id: Uuid,
    team_id: Uuid,
    my_score: u32,
    opponent_score: u32,
) -> Result<ScoreResponse, ServiceError> {
    let timing = state.config().timing;
    let rating_config = state.config().rating;
    state
        .run_exclusive(|store, now| async move {
            let store = store.as_ref();
            deadline::advance(store, now, &timing).await?;
            let mut entity = query_service::load_match(store, match_id).await?;
            if entity.status == MatchStatus::Completed {
                return Err(ServiceError::InvalidState(format!(
                    "match `{match_id}` is already completed"
                )));
            }
            participant_side(&entity, team_id)?;
            if !matches!(entity.status, MatchStatus::Active | MatchStatus::Finished) {
                return Err(ServiceError::InvalidState(format!(
                    "match `{match_id}` has not started"
                )));
            }
            if my_score > MAX_SCORE || opponent_score > MAX_SCORE {
                return Err(ServiceError::InvalidInput(format!(
                    "scores must be between 0 and {MAX_SCORE}"
                )));
            }
            if my_score == opponent_score {
                return Err(ServiceError::InvalidInput(
                    "a table match cannot end in a tie".into(),
                ));
            }

            store
                .upsert_submission(SubmissionEntity {
                    match_id,
                    team_id,
                    score_for: my_score,
                    score_against: opponent_score,
                    submitted_at: now,
                })
                .await?;
            entity.mismatch = false;

            let submissions = store.list_submissions(match_id).await?;
            let claim_of = |id: Uuid| submissions.iter().find(|s| s.team_id == id);
            let outcome = match (claim_of(entity.team1_id), claim_of(entity.team2_id)) {
                (Some(first), Some(second)) if claims_agree(first, second) => {
                    finalise(store, &mut entity, first, now, &rating_config).await?;
                    ScoreOutcome::Completed
                }
                (Some(_), Some(_)) => {
                    entity.mismatch = true;
                    store.save_match(entity.clone()).await?;
                    warn!(match_id = %match_id, "score submissions disagree");
                    ScoreOutcome::Mismatch
                }
                _ => {
                    store.save_match(entity.clone()).await?;
                    ScoreOutcome::WaitingForOpponent
                }
            };

            Ok(ScoreResponse {
                outcome,
                snapshot: query_service::snapshot(store, &entity).await?,
            })
        })
        .await
}

/// Discard both claims of a disputed match so the teams can submit again.
pub async fn reset_mismatch(
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
            participant_side(&entity, team_id)?;
            if entity.status == MatchStatus::Completed {
                return Err(ServiceError::InvalidState(format!(
                    "match `{match_id}` is already completed"
                )));
            }

            store.delete_submissions(match_id).await?;
            entity.mismatch = false;
            store.save_match(entity.clone()).await?;
            info!(match_id = %match_id, team_id = %team_id, "score submissions reset");

            query_service::snapshot(store, &entity).await
        })
        .await
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn claim(score_for: u32, score_against: u32) -> SubmissionEntity {
        SubmissionEntity {
            match_id: Uuid::nil(),
            team_id: Uuid::new_v4(),
            score_for,
            score_against,
            submitted_at: datetime!(2025-05-10 20:30 UTC),
        }
    }

    #[test]
    fn mirrored_claims_agree_in_both_orders() {
        assert!(claims_agree(&claim(10, 5), &claim(5, 10)));
        assert!(claims_agree(&claim(5, 10), &claim(10, 5)));
    }

    #[test]
    fn differing_claims_disagree() {
        assert!(!claims_agree(&claim(10, 5), &claim(7, 10)));
        assert!(!claims_agree(&claim(10, 5), &claim(10, 5)));
    }
}

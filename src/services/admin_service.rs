//! Business logic powering the admin REST routes: registering teams and tables.

use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{TableEntity, TeamEntity},
    },
    dto::admin::{CreateTableRequest, CreateTeamRequest, TableSummary, TeamSummary},
    error::ServiceError,
    state::SharedState,
};

fn sanitize_name(raw: &str, kind: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{kind} name is empty")));
    }
    Ok(name.to_owned())
}

/// Register a team with the initial rating.
pub async fn create_team(
    state: &SharedState,
    payload: CreateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    payload
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let name = sanitize_name(&payload.name, "team")?;
    let initial_rating = state.config().rating.initial_rating;

    state
        .run_exclusive(|store, now| async move {
            if store.find_team_by_name(name.clone()).await?.is_some() {
                return Err(ServiceError::InvalidInput(format!(
                    "team name `{name}` is already taken"
                )));
            }

            let team = TeamEntity::new(name, initial_rating, now);
            store.save_team(team.clone()).await?;
            info!(team_id = %team.id, name = %team.name, "team registered");
            Ok(team.into())
        })
        .await
}

/// Add a table to the venue.
pub async fn create_table(
    state: &SharedState,
    payload: CreateTableRequest,
) -> Result<TableSummary, ServiceError> {
    payload
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let name = sanitize_name(&payload.name, "table")?;

    state
        .run_exclusive(|store, now| async move {
            let table = TableEntity::new(name, now);
            store.save_table(table.clone()).await?;
            info!(table_id = %table.id, name = %table.name, "table added");
            Ok(table.into())
        })
        .await
}

/// Create the configured tables when the store has none yet.
pub async fn seed_tables(
    store: &dyn MatchStore,
    names: &[String],
    now: OffsetDateTime,
) -> Result<usize, ServiceError> {
    if !store.list_tables().await?.is_empty() {
        debug!("tables already present; skipping seed");
        return Ok(0);
    }

    // Distinct timestamps keep the configured order stable.
    for (offset, name) in names.iter().enumerate() {
        let created_at = now + Duration::milliseconds(offset as i64);
        store
            .save_table(TableEntity::new(name.clone(), created_at))
            .await?;
    }
    info!(count = names.len(), "seeded tables");
    Ok(names.len())
}

//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{TableEntity, TeamEntity, TeamStatus};

/// Longest accepted team or table name, in characters.
pub const MAX_NAME_LEN: u64 = 64;

/// Payload registering a new team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 64, message = "name must be 1 to 64 characters"))]
    pub name: String,
}

/// Payload adding a table.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTableRequest {
    #[validate(length(min = 1, max = 64, message = "name must be 1 to 64 characters"))]
    pub name: String,
}

/// Minimal projection of a team returned to administrators.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub status: TeamStatus,
    pub rating: i32,
}

impl From<TeamEntity> for TeamSummary {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            status: value.status,
            rating: value.rating,
        }
    }
}

/// Minimal projection of a table returned to administrators.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<TableEntity> for TableSummary {
    fn from(value: TableEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_present_and_short() {
        assert!(
            CreateTeamRequest {
                name: "Rackets".into()
            }
            .validate()
            .is_ok()
        );
        assert!(CreateTeamRequest { name: String::new() }.validate().is_err());
        assert!(
            CreateTableRequest {
                name: "x".repeat(MAX_NAME_LEN as usize + 1)
            }
            .validate()
            .is_err()
        );
    }
}

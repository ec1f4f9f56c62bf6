//! DTOs for registering players into a room.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::TournamentPlayerEntity,
    dto::{format_system_time, validation::validate_not_blank},
};

const MAX_NAME_LEN: usize = 60;
const MAX_GROUP_LEN: usize = 40;

/// Payload sent by a device to add a player to a room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterPlayerRequest {
    #[validate(length(min = 1, max = 60), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub group: Option<String>,
    /// Link to an existing directory player.
    #[serde(default)]
    pub universal_player_id: Option<i64>,
}

/// Director edit of a registered player.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePlayerRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// If not specified, keeps the current group.
    /// If null is specified, clears the group.
    /// If a string is specified, sets the group.
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub group: Option<Option<String>>,
}

impl Validate for UpdatePlayerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref name) = self.name {
            if let Err(e) = validate_not_blank(name) {
                errors.add("name", e);
            } else if name.chars().count() > MAX_NAME_LEN {
                errors.add("name", too_long("name", MAX_NAME_LEN));
            }
        }

        if let Some(Some(ref group)) = self.group {
            if group.chars().count() > MAX_GROUP_LEN {
                errors.add("group", too_long("group", MAX_GROUP_LEN));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn too_long(field: &'static str, max: usize) -> ValidationError {
    let mut err = ValidationError::new("length");
    err.message = Some(format!("{field} must be at most {max} characters").into());
    err
}

/// Toggle the did-not-finish flag.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetDnfRequest {
    pub did_not_finish: bool,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Projection of a registered player exposed to REST/SSE clients.
pub struct TournamentPlayerSummary {
    pub id: i64,
    pub tournament_id: i64,
    pub name: String,
    pub group: Option<String>,
    pub universal_player_id: Option<i64>,
    pub did_not_finish: bool,
    pub created_at: String,
}

impl From<&TournamentPlayerEntity> for TournamentPlayerSummary {
    fn from(value: &TournamentPlayerEntity) -> Self {
        Self {
            id: value.id,
            tournament_id: value.tournament_id,
            name: value.name.clone(),
            group: value.group.clone(),
            universal_player_id: value.universal_player_id,
            did_not_finish: value.did_not_finish,
            created_at: format_system_time(value.created_at),
        }
    }
}

//! DTOs for tournament room management.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::TournamentEntity,
    dto::{
        format_system_time,
        leaderboard::LeaderboardEntry,
        validation::{validate_director_pin, validate_not_blank, validate_room_code},
    },
    state::lifecycle::TournamentPhase,
};

/// Payload used by a director to open a new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTournamentRequest {
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub name: String,
    /// 4 to 12 digits; required later on every director action.
    #[validate(custom(function = "validate_director_pin"))]
    pub director_pin: String,
    /// Optional room code; generated when omitted.
    #[serde(default)]
    #[validate(custom(function = "validate_room_code"))]
    pub code: Option<String>,
}

/// Rename a room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateTournamentRequest {
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub name: String,
}

/// Lifecycle phase exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseDto {
    /// Registration open, play not started.
    Active,
    /// Play in progress.
    Started,
    /// Room closed and archived.
    Closed,
}

impl From<TournamentPhase> for PhaseDto {
    fn from(value: TournamentPhase) -> Self {
        match value {
            TournamentPhase::Active => PhaseDto::Active,
            TournamentPhase::Started => PhaseDto::Started,
            TournamentPhase::Closed => PhaseDto::Closed,
        }
    }
}

/// Public projection of a tournament. Never carries the director PIN.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TournamentSummary {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub phase: PhaseDto,
    pub is_active: bool,
    pub is_started: bool,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&TournamentEntity> for TournamentSummary {
    fn from(value: &TournamentEntity) -> Self {
        Self {
            id: value.id,
            code: value.code.clone(),
            name: value.name.clone(),
            phase: TournamentPhase::of(value).into(),
            is_active: value.is_active,
            is_started: value.is_started,
            is_completed: value.is_completed,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Tournament details returned to a single room, with the client polling hint.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct TournamentDetails {
    #[serde(flatten)]
    pub tournament: TournamentSummary,
    pub player_count: usize,
    /// Seconds between leaderboard refreshes for clients not using the event stream.
    pub refresh_interval_secs: u64,
    /// Present once the room is closed.
    pub archived_at: Option<String>,
}

/// Result of closing a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct CloseTournamentResponse {
    pub tournament: TournamentSummary,
    /// Number of history entries written for linked directory players.
    pub archived_entries: usize,
    /// Final standings at the time of closing.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Generic action acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{
    leaderboard::LeaderboardEntry, player::TournamentPlayerSummary, score::ScoreSummary,
    tournament::TournamentSummary,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already serialised data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a score row was stored.
pub struct ScoreSubmittedEvent {
    pub score: ScoreSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Full leaderboard of the room, sent on connect and after every change.
pub struct LeaderboardEvent {
    pub tournament_code: String,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player joins the room.
pub struct PlayerRegisteredEvent {
    pub player: TournamentPlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a director edits a player or toggles DNF.
pub struct PlayerUpdatedEvent {
    pub player: TournamentPlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the room is renamed, started or closed.
pub struct TournamentStatusEvent(pub TournamentSummary);

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Tournament room persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentEntity {
    /// Primary key of the tournament.
    pub id: i64,
    /// Room code typed by players to join (upper case, unique).
    pub code: String,
    /// Display name of the tournament.
    pub name: String,
    /// Shared secret authorising director operations.
    pub director_pin: String,
    /// Whether the room still accepts registrations and scores.
    pub is_active: bool,
    /// Whether the director started play.
    pub is_started: bool,
    /// Whether the room has been closed and archived.
    pub is_completed: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the tournament row was updated.
    pub updated_at: SystemTime,
}

/// Insert payload for a tournament; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTournament {
    pub code: String,
    pub name: String,
    pub director_pin: String,
}

/// Player registered in exactly one tournament room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentPlayerEntity {
    /// Primary key of the tournament player.
    pub id: i64,
    /// Owning tournament.
    pub tournament_id: i64,
    /// Display name used on the leaderboard.
    pub name: String,
    /// Optional group (flight) label.
    pub group: Option<String>,
    /// Link to the persistent player directory, if any.
    pub universal_player_id: Option<i64>,
    /// Player abandoned the round and is hidden from the leaderboard.
    pub did_not_finish: bool,
    /// Registration timestamp.
    pub created_at: SystemTime,
}

/// Insert payload for a tournament player.
#[derive(Debug, Clone)]
pub struct NewTournamentPlayer {
    pub tournament_id: i64,
    pub name: String,
    pub group: Option<String>,
    pub universal_player_id: Option<i64>,
}

/// One recorded hole for one player. At most one row exists per
/// `(tournament_player_id, hole)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentScoreEntity {
    /// Owning tournament, denormalised for room-wide reads.
    pub tournament_id: i64,
    pub tournament_player_id: i64,
    pub hole: u32,
    pub par: u32,
    pub strokes: u32,
    pub scratches: u32,
    pub penalties: u32,
    /// Time of the last submission for this hole.
    pub updated_at: SystemTime,
}

impl TournamentScoreEntity {
    /// Strokes counted for the hole once scratches and penalties are added.
    pub fn total_strokes(&self) -> u32 {
        self.strokes + self.scratches + self.penalties
    }
}

/// Persistent identity in the player directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UniversalPlayerEntity {
    pub id: i64,
    pub name: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Where a history entry came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    /// Typed in by hand from the directory.
    Manual,
    /// Archived when a tournament was closed.
    Tournament,
}

/// One past tournament result of a universal player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerHistoryEntity {
    pub id: i64,
    pub universal_player_id: i64,
    pub tournament_name: String,
    /// Source tournament when the entry was archived automatically.
    pub tournament_id: Option<i64>,
    pub played_at: SystemTime,
    pub holes_played: u32,
    pub total_strokes: u32,
    pub total_par: u32,
    pub scratches: u32,
    pub penalties: u32,
    pub source: HistorySource,
}

/// Insert payload for a history entry.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub universal_player_id: i64,
    pub tournament_name: String,
    pub tournament_id: Option<i64>,
    pub played_at: SystemTime,
    pub holes_played: u32,
    pub total_strokes: u32,
    pub total_par: u32,
    pub scratches: u32,
    pub penalties: u32,
    pub source: HistorySource,
}

//! Leaderboard projections.

use serde::Serialize;
use utoipa::ToSchema;

/// Standing of one player in a room.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Competition rank (1, 2, 2, 4) on relative-to-par.
    pub position: u32,
    pub player_id: i64,
    pub name: String,
    pub group: Option<String>,
    pub total_strokes: u32,
    pub total_par: u32,
    pub holes_completed: u32,
    /// total_strokes minus total_par; 0 when no holes were played.
    pub relative_to_par: i64,
    pub total_scratches: u32,
    pub total_penalties: u32,
}

/// Leaderboard of a room.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub tournament_code: String,
    pub entries: Vec<LeaderboardEntry>,
}

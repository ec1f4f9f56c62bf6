//! DTOs for the persistent player directory: players, history, statistics,
//! merge and JSON import/export.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    dao::models::{HistorySource, NewHistoryEntry, PlayerHistoryEntity, UniversalPlayerEntity},
    dto::{format_system_time, parse_system_time, validation::validate_not_blank},
    services::handicap::HandicapStats,
};

/// Version written into export documents and accepted on import.
pub const EXPORT_VERSION: u32 = 1;

/// Longest course a history entry may describe.
pub const MAX_HISTORY_HOLES: u32 = 99;
/// Upper bound of strokes over a whole entry: 20 strokes plus 20 scratches
/// plus 20 penalties on each hole.
pub const MAX_HISTORY_STROKES: u32 = MAX_HISTORY_HOLES * 60;
/// Upper bound of par over a whole entry.
pub const MAX_HISTORY_PAR: u32 = MAX_HISTORY_HOLES * 10;
/// Upper bound of scratches or penalties over a whole entry.
pub const MAX_HISTORY_INFRACTIONS: u32 = MAX_HISTORY_HOLES * 20;

/// Create or rename a directory player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UniversalPlayerRequest {
    #[validate(length(min = 1, max = 60), custom(function = "validate_not_blank"))]
    pub name: String,
}

/// Directory player as returned by the API.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct UniversalPlayerSummary {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&UniversalPlayerEntity> for UniversalPlayerSummary {
    fn from(value: &UniversalPlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Origin of a history entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistorySourceDto {
    #[default]
    Manual,
    Tournament,
}

impl From<HistorySource> for HistorySourceDto {
    fn from(value: HistorySource) -> Self {
        match value {
            HistorySource::Manual => HistorySourceDto::Manual,
            HistorySource::Tournament => HistorySourceDto::Tournament,
        }
    }
}

impl From<HistorySourceDto> for HistorySource {
    fn from(value: HistorySourceDto) -> Self {
        match value {
            HistorySourceDto::Manual => HistorySource::Manual,
            HistorySourceDto::Tournament => HistorySource::Tournament,
        }
    }
}

/// Past tournament result, typed in by hand or carried by an import file.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct HistoryEntryInput {
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub tournament_name: String,
    /// RFC 3339 timestamp; defaults to now.
    #[serde(default)]
    #[validate(custom(function = "validate_played_at"))]
    pub played_at: Option<String>,
    #[validate(range(max = MAX_HISTORY_HOLES))]
    pub holes_played: u32,
    #[validate(range(max = MAX_HISTORY_STROKES))]
    pub total_strokes: u32,
    #[validate(range(max = MAX_HISTORY_PAR))]
    pub total_par: u32,
    #[serde(default)]
    #[validate(range(max = MAX_HISTORY_INFRACTIONS))]
    pub scratches: u32,
    #[serde(default)]
    #[validate(range(max = MAX_HISTORY_INFRACTIONS))]
    pub penalties: u32,
    /// Room the result was archived from, when it came from a tournament.
    #[serde(default)]
    pub tournament_id: Option<i64>,
    #[serde(default)]
    pub source: HistorySourceDto,
}

fn validate_played_at(value: &str) -> Result<(), ValidationError> {
    parse_system_time(value).map(|_| ()).map_err(|source| {
        let mut err = ValidationError::new("played_at");
        err.message = Some(format!("played_at must be an RFC 3339 timestamp: {source}").into());
        err
    })
}

impl HistoryEntryInput {
    /// Convert into an insert payload for `universal_player_id`.
    ///
    /// Unparseable timestamps fall back to `now`; callers validate first.
    pub fn into_new_entry(self, universal_player_id: i64, now: SystemTime) -> NewHistoryEntry {
        let played_at = self
            .played_at
            .as_deref()
            .and_then(|value| parse_system_time(value).ok())
            .unwrap_or(now);
        NewHistoryEntry {
            universal_player_id,
            tournament_name: self.tournament_name.trim().to_owned(),
            tournament_id: self.tournament_id,
            played_at,
            holes_played: self.holes_played,
            total_strokes: self.total_strokes,
            total_par: self.total_par,
            scratches: self.scratches,
            penalties: self.penalties,
            source: self.source.into(),
        }
    }
}

impl From<&PlayerHistoryEntity> for HistoryEntryInput {
    fn from(value: &PlayerHistoryEntity) -> Self {
        Self {
            tournament_name: value.tournament_name.clone(),
            played_at: Some(format_system_time(value.played_at)),
            holes_played: value.holes_played,
            total_strokes: value.total_strokes,
            total_par: value.total_par,
            scratches: value.scratches,
            penalties: value.penalties,
            tournament_id: value.tournament_id,
            source: value.source.into(),
        }
    }
}

/// Stored history entry.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct HistoryEntrySummary {
    pub id: i64,
    pub universal_player_id: i64,
    pub tournament_name: String,
    pub tournament_id: Option<i64>,
    pub played_at: String,
    pub holes_played: u32,
    pub total_strokes: u32,
    pub total_par: u32,
    pub scratches: u32,
    pub penalties: u32,
    pub source: HistorySourceDto,
}

impl From<&PlayerHistoryEntity> for HistoryEntrySummary {
    fn from(value: &PlayerHistoryEntity) -> Self {
        Self {
            id: value.id,
            universal_player_id: value.universal_player_id,
            tournament_name: value.tournament_name.clone(),
            tournament_id: value.tournament_id,
            played_at: format_system_time(value.played_at),
            holes_played: value.holes_played,
            total_strokes: value.total_strokes,
            total_par: value.total_par,
            scratches: value.scratches,
            penalties: value.penalties,
            source: value.source.into(),
        }
    }
}

/// Handicap-style infraction statistics of a directory player.
#[derive(Debug, Serialize, ToSchema)]
pub struct HandicapStatsResponse {
    pub universal_player_id: i64,
    pub name: String,
    /// Number of history entries.
    pub completed_tournaments: u32,
    /// Linked players in rooms that are not closed yet.
    pub live_tournaments: u32,
    pub holes_played: u64,
    /// Scratches plus penalties.
    pub infractions: u64,
    pub total_strokes: u64,
    pub total_par: u64,
    /// Mean of (strokes - par) per counted tournament.
    pub average_relative_to_par: f64,
    /// Infractions per tournament.
    pub ppt: f64,
    /// Infractions per hole.
    pub ppc: f64,
}

impl HandicapStatsResponse {
    /// Pair a directory player with their computed statistics.
    pub fn new(player: &UniversalPlayerEntity, stats: HandicapStats) -> Self {
        Self {
            universal_player_id: player.id,
            name: player.name.clone(),
            completed_tournaments: stats.completed_tournaments,
            live_tournaments: stats.live_tournaments,
            holes_played: stats.holes_played,
            infractions: stats.infractions,
            total_strokes: stats.total_strokes,
            total_par: stats.total_par,
            average_relative_to_par: stats.average_relative_to_par,
            ppt: stats.ppt,
            ppc: stats.ppc,
        }
    }
}

/// Fold `source_id` into `target_id`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MergePlayersRequest {
    pub source_id: i64,
    pub target_id: i64,
}

/// Outcome of a merge: the surviving player and what moved onto it.
#[derive(Debug, Serialize, ToSchema)]
pub struct MergePlayersResponse {
    pub target: UniversalPlayerSummary,
    pub moved_history: u64,
    pub relinked_players: u64,
}

/// Whole-directory JSON document.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct DirectoryExport {
    #[validate(range(min = 1, max = 1))]
    pub version: u32,
    /// RFC 3339 timestamp of the export.
    #[serde(default)]
    pub exported_at: Option<String>,
    #[validate(nested)]
    pub players: Vec<ExportedPlayer>,
}

/// One player of an export document. `id` is informative only on import.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct ExportedPlayer {
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 60), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub history: Vec<HistoryEntryInput>,
}

/// Counters reported after an import.
#[derive(Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct ImportResult {
    /// Players created from the document.
    pub created_players: usize,
    /// Players folded into an existing one with the same name.
    pub merged_players: usize,
    pub history_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_input_defaults_to_manual_and_now() {
        let input: HistoryEntryInput = serde_json::from_str(
            r#"{"tournament_name": " Spring Open ", "holes_played": 9, "total_strokes": 30, "total_par": 27}"#,
        )
        .unwrap();
        assert!(input.validate().is_ok());

        let now = SystemTime::UNIX_EPOCH;
        let entry = input.into_new_entry(7, now);
        assert_eq!(entry.universal_player_id, 7);
        assert_eq!(entry.tournament_name, "Spring Open");
        assert_eq!(entry.played_at, now);
        assert_eq!(entry.source, HistorySource::Manual);
    }

    #[test]
    fn history_input_rejects_bad_timestamp() {
        let input: HistoryEntryInput = serde_json::from_str(
            r#"{"tournament_name": "Cup", "played_at": "yesterday", "holes_played": 9, "total_strokes": 30, "total_par": 27}"#,
        )
        .unwrap();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("played_at"));
    }

    #[test]
    fn history_input_bounds_whole_entry_totals() {
        let input: HistoryEntryInput = serde_json::from_str(
            r#"{"tournament_name": "Cup", "holes_played": 18, "total_strokes": 3000000000, "total_par": 54, "penalties": 5000}"#,
        )
        .unwrap();
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("total_strokes"));
        assert!(fields.contains_key("penalties"));
        assert!(!fields.contains_key("total_par"));
    }

    #[test]
    fn export_document_checks_version_and_nested_names() {
        let document: DirectoryExport = serde_json::from_str(
            r#"{"version": 2, "players": [{"name": "  ", "history": []}]}"#,
        )
        .unwrap();
        let errors = document.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("version"));
        assert!(fields.contains_key("players"));
    }
}

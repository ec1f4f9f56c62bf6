use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{
    HistorySource, PlayerHistoryEntity, TournamentEntity, TournamentPlayerEntity,
    TournamentScoreEntity, UniversalPlayerEntity,
};

/// Stored form of a tournament room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTournamentDocument {
    #[serde(rename = "_id")]
    id: i64,
    code: String,
    name: String,
    director_pin: String,
    is_active: bool,
    is_started: bool,
    is_completed: bool,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<TournamentEntity> for MongoTournamentDocument {
    fn from(value: TournamentEntity) -> Self {
        Self {
            id: value.id,
            code: value.code,
            name: value.name,
            director_pin: value.director_pin,
            is_active: value.is_active,
            is_started: value.is_started,
            is_completed: value.is_completed,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoTournamentDocument> for TournamentEntity {
    fn from(value: MongoTournamentDocument) -> Self {
        Self {
            id: value.id,
            code: value.code,
            name: value.name,
            director_pin: value.director_pin,
            is_active: value.is_active,
            is_started: value.is_started,
            is_completed: value.is_completed,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Stored form of a player registered in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: i64,
    tournament_id: i64,
    name: String,
    group: Option<String>,
    universal_player_id: Option<i64>,
    #[serde(default)]
    did_not_finish: bool,
    created_at: DateTime,
}

impl From<TournamentPlayerEntity> for MongoPlayerDocument {
    fn from(value: TournamentPlayerEntity) -> Self {
        Self {
            id: value.id,
            tournament_id: value.tournament_id,
            name: value.name,
            group: value.group,
            universal_player_id: value.universal_player_id,
            did_not_finish: value.did_not_finish,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoPlayerDocument> for TournamentPlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: value.id,
            tournament_id: value.tournament_id,
            name: value.name,
            group: value.group,
            universal_player_id: value.universal_player_id,
            did_not_finish: value.did_not_finish,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Score rows carry no `_id` of their own; the unique `(tournament_player_id, hole)`
/// index identifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    tournament_id: i64,
    tournament_player_id: i64,
    hole: i64,
    par: i64,
    strokes: i64,
    scratches: i64,
    penalties: i64,
    updated_at: DateTime,
}

impl From<TournamentScoreEntity> for MongoScoreDocument {
    fn from(value: TournamentScoreEntity) -> Self {
        Self {
            tournament_id: value.tournament_id,
            tournament_player_id: value.tournament_player_id,
            hole: value.hole.into(),
            par: value.par.into(),
            strokes: value.strokes.into(),
            scratches: value.scratches.into(),
            penalties: value.penalties.into(),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoScoreDocument> for TournamentScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            tournament_id: value.tournament_id,
            tournament_player_id: value.tournament_player_id,
            hole: clamp_u32(value.hole),
            par: clamp_u32(value.par),
            strokes: clamp_u32(value.strokes),
            scratches: clamp_u32(value.scratches),
            penalties: clamp_u32(value.penalties),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Stored form of a directory player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUniversalPlayerDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<UniversalPlayerEntity> for MongoUniversalPlayerDocument {
    fn from(value: UniversalPlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoUniversalPlayerDocument> for UniversalPlayerEntity {
    fn from(value: MongoUniversalPlayerDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Stored form of a history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoHistoryDocument {
    #[serde(rename = "_id")]
    id: i64,
    universal_player_id: i64,
    tournament_name: String,
    tournament_id: Option<i64>,
    played_at: DateTime,
    holes_played: i64,
    total_strokes: i64,
    total_par: i64,
    scratches: i64,
    penalties: i64,
    source: HistorySource,
}

impl From<PlayerHistoryEntity> for MongoHistoryDocument {
    fn from(value: PlayerHistoryEntity) -> Self {
        Self {
            id: value.id,
            universal_player_id: value.universal_player_id,
            tournament_name: value.tournament_name,
            tournament_id: value.tournament_id,
            played_at: DateTime::from_system_time(value.played_at),
            holes_played: value.holes_played.into(),
            total_strokes: value.total_strokes.into(),
            total_par: value.total_par.into(),
            scratches: value.scratches.into(),
            penalties: value.penalties.into(),
            source: value.source,
        }
    }
}

impl From<MongoHistoryDocument> for PlayerHistoryEntity {
    fn from(value: MongoHistoryDocument) -> Self {
        Self {
            id: value.id,
            universal_player_id: value.universal_player_id,
            tournament_name: value.tournament_name,
            tournament_id: value.tournament_id,
            played_at: value.played_at.to_system_time(),
            holes_played: clamp_u32(value.holes_played),
            total_strokes: clamp_u32(value.total_strokes),
            total_par: clamp_u32(value.total_par),
            scratches: clamp_u32(value.scratches),
            penalties: clamp_u32(value.penalties),
            source: value.source,
        }
    }
}

/// Counter document backing integer id allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounterDocument {
    #[serde(rename = "_id")]
    pub sequence: String,
    pub value: i64,
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Filter matching a document by its numeric `_id`.
pub fn doc_id(id: i64) -> Document {
    doc! {"_id": id}
}

/// Filter matching the single score row of a player and hole.
pub fn score_key(tournament_player_id: i64, hole: u32) -> Document {
    doc! {"tournament_player_id": tournament_player_id, "hole": i64::from(hole)}
}

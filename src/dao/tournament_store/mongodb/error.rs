use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB backend, one variant per failing operation.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to allocate next id for `{sequence}`")]
    NextId {
        sequence: &'static str,
        #[source]
        source: Option<MongoError>,
    },
    #[error("room code `{code}` already in use")]
    DuplicateCode { code: String },
    #[error("failed to save tournament `{id}`")]
    SaveTournament {
        id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to load tournament `{code}`")]
    LoadTournament {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list tournaments")]
    ListTournaments {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete tournament `{id}`")]
    DeleteTournament {
        id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to save tournament player `{id}`")]
    SavePlayer {
        id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to load tournament players")]
    LoadPlayers {
        #[source]
        source: MongoError,
    },
    #[error("failed to relink tournament players from `{from}` to `{to}`")]
    RelinkPlayers {
        from: i64,
        to: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to save score for player `{player_id}` hole {hole}")]
    SaveScore {
        player_id: i64,
        hole: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to load scores for tournament `{tournament_id}`")]
    LoadScores {
        tournament_id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to save universal player `{id}`")]
    SaveUniversalPlayer {
        id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to load universal players")]
    LoadUniversalPlayers {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete universal player `{id}`")]
    DeleteUniversalPlayer {
        id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to save history entry `{id}`")]
    SaveHistory {
        id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to load history for universal player `{universal_player_id}`")]
    LoadHistory {
        universal_player_id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete history entry `{id}`")]
    DeleteHistory {
        id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to move history from `{from}` to `{to}`")]
    ReassignHistory {
        from: i64,
        to: i64,
        #[source]
        source: MongoError,
    },
}

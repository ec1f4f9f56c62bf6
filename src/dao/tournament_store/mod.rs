#[cfg(test)]
pub(crate) mod faulty;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    NewHistoryEntry, NewTournament, NewTournamentPlayer, PlayerHistoryEntity, TournamentEntity,
    TournamentPlayerEntity, TournamentScoreEntity, UniversalPlayerEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for tournament rooms and the player directory.
pub trait TournamentStore: Send + Sync {
    /// Insert a tournament; fails with a conflict when the code is taken.
    fn create_tournament(
        &self,
        tournament: NewTournament,
    ) -> BoxFuture<'static, StorageResult<TournamentEntity>>;
    fn save_tournament(&self, tournament: TournamentEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_tournament_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>>;
    fn list_tournaments(&self) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>>;
    /// Remove a tournament together with its players and scores.
    fn delete_tournament(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    fn create_tournament_player(
        &self,
        player: NewTournamentPlayer,
    ) -> BoxFuture<'static, StorageResult<TournamentPlayerEntity>>;
    fn save_tournament_player(
        &self,
        player: TournamentPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_tournament_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentPlayerEntity>>>;
    fn list_tournament_players(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>>;
    /// Tournament players linked to a directory entry, across all rooms.
    fn list_players_for_universal(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>>;
    /// Point every tournament player linked to `from` at `to`, returning how many moved.
    fn relink_tournament_players(
        &self,
        from: i64,
        to: i64,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    /// Insert or overwrite the row for `(tournament_player_id, hole)`.
    fn upsert_score(
        &self,
        score: TournamentScoreEntity,
    ) -> BoxFuture<'static, StorageResult<TournamentScoreEntity>>;
    fn list_scores(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentScoreEntity>>>;

    fn create_universal_player(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<UniversalPlayerEntity>>;
    fn save_universal_player(
        &self,
        player: UniversalPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_universal_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<UniversalPlayerEntity>>>;
    fn list_universal_players(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<UniversalPlayerEntity>>>;
    fn delete_universal_player(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    fn add_history(
        &self,
        entry: NewHistoryEntry,
    ) -> BoxFuture<'static, StorageResult<PlayerHistoryEntity>>;
    fn list_history(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerHistoryEntity>>>;
    fn delete_history(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;
    /// Move every history row owned by `from` to `to`, returning how many moved.
    fn reassign_history(&self, from: i64, to: i64) -> BoxFuture<'static, StorageResult<u64>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

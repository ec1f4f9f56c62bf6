//! Test backend wrapping the memory store; chosen operations can be made to fail.

use std::{
    collections::HashSet,
    io,
    sync::{Arc, Mutex},
};

use futures::future::BoxFuture;

use super::{TournamentStore, memory::MemoryTournamentStore};
use crate::dao::{
    models::{
        NewHistoryEntry, NewTournament, NewTournamentPlayer, PlayerHistoryEntity,
        TournamentEntity, TournamentPlayerEntity, TournamentScoreEntity, UniversalPlayerEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Memory store with switchable failures.
#[derive(Clone, Default)]
pub struct FaultyTournamentStore {
    inner: MemoryTournamentStore,
    failing: Arc<Mutex<HashSet<&'static str>>>,
    add_history_budget: Arc<Mutex<Option<usize>>>,
}

impl FaultyTournamentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` fail.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
        *self.add_history_budget.lock().unwrap() = None;
    }

    /// Let `count` more history inserts through, then fail the rest.
    pub fn allow_history_inserts(&self, count: usize) {
        *self.add_history_budget.lock().unwrap() = Some(count);
    }

    fn check(&self, operation: &'static str) -> StorageResult<()> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(injected(operation));
        }
        Ok(())
    }

    fn check_history_insert(&self) -> StorageResult<()> {
        self.check("add_history")?;
        let mut budget = self.add_history_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => Err(injected("add_history")),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn injected(operation: &'static str) -> StorageError {
    StorageError::unavailable(operation.to_owned(), io::Error::other("injected failure"))
}

macro_rules! guarded {
    ($self:ident, $operation:literal, $call:expr) => {{
        if let Err(err) = $self.check($operation) {
            return Box::pin(async move { Err(err) });
        }
        $call
    }};
}

impl TournamentStore for FaultyTournamentStore {
    fn create_tournament(
        &self,
        tournament: NewTournament,
    ) -> BoxFuture<'static, StorageResult<TournamentEntity>> {
        guarded!(self, "create_tournament", TournamentStore::create_tournament(&self.inner, tournament))
    }

    fn save_tournament(&self, tournament: TournamentEntity) -> BoxFuture<'static, StorageResult<()>> {
        guarded!(self, "save_tournament", TournamentStore::save_tournament(&self.inner, tournament))
    }

    fn find_tournament_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        guarded!(self, "find_tournament_by_code", TournamentStore::find_tournament_by_code(&self.inner, code))
    }

    fn list_tournaments(&self) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        guarded!(self, "list_tournaments", TournamentStore::list_tournaments(&self.inner))
    }

    fn delete_tournament(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        guarded!(self, "delete_tournament", TournamentStore::delete_tournament(&self.inner, id))
    }

    fn create_tournament_player(
        &self,
        player: NewTournamentPlayer,
    ) -> BoxFuture<'static, StorageResult<TournamentPlayerEntity>> {
        guarded!(self, "create_tournament_player", TournamentStore::create_tournament_player(&self.inner, player))
    }

    fn save_tournament_player(
        &self,
        player: TournamentPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        guarded!(self, "save_tournament_player", TournamentStore::save_tournament_player(&self.inner, player))
    }

    fn find_tournament_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentPlayerEntity>>> {
        guarded!(self, "find_tournament_player", TournamentStore::find_tournament_player(&self.inner, id))
    }

    fn list_tournament_players(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>> {
        guarded!(self, "list_tournament_players", TournamentStore::list_tournament_players(&self.inner, tournament_id))
    }

    fn list_players_for_universal(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>> {
        guarded!(
            self,
            "list_players_for_universal",
            TournamentStore::list_players_for_universal(&self.inner, universal_player_id)
        )
    }

    fn relink_tournament_players(
        &self,
        from: i64,
        to: i64,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        guarded!(self, "relink_tournament_players", TournamentStore::relink_tournament_players(&self.inner, from, to))
    }

    fn upsert_score(
        &self,
        score: TournamentScoreEntity,
    ) -> BoxFuture<'static, StorageResult<TournamentScoreEntity>> {
        guarded!(self, "upsert_score", TournamentStore::upsert_score(&self.inner, score))
    }

    fn list_scores(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentScoreEntity>>> {
        guarded!(self, "list_scores", TournamentStore::list_scores(&self.inner, tournament_id))
    }

    fn create_universal_player(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<UniversalPlayerEntity>> {
        guarded!(self, "create_universal_player", TournamentStore::create_universal_player(&self.inner, name))
    }

    fn save_universal_player(
        &self,
        player: UniversalPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        guarded!(self, "save_universal_player", TournamentStore::save_universal_player(&self.inner, player))
    }

    fn find_universal_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<UniversalPlayerEntity>>> {
        guarded!(self, "find_universal_player", TournamentStore::find_universal_player(&self.inner, id))
    }

    fn list_universal_players(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<UniversalPlayerEntity>>> {
        guarded!(self, "list_universal_players", TournamentStore::list_universal_players(&self.inner))
    }

    fn delete_universal_player(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        guarded!(self, "delete_universal_player", TournamentStore::delete_universal_player(&self.inner, id))
    }

    fn add_history(
        &self,
        entry: NewHistoryEntry,
    ) -> BoxFuture<'static, StorageResult<PlayerHistoryEntity>> {
        if let Err(err) = self.check_history_insert() {
            return Box::pin(async move { Err(err) });
        }
        TournamentStore::add_history(&self.inner, entry)
    }

    fn list_history(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerHistoryEntity>>> {
        guarded!(self, "list_history", TournamentStore::list_history(&self.inner, universal_player_id))
    }

    fn delete_history(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        guarded!(self, "delete_history", TournamentStore::delete_history(&self.inner, id))
    }

    fn reassign_history(&self, from: i64, to: i64) -> BoxFuture<'static, StorageResult<u64>> {
        guarded!(self, "reassign_history", TournamentStore::reassign_history(&self.inner, from, to))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        guarded!(self, "health_check", TournamentStore::health_check(&self.inner))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        guarded!(self, "try_reconnect", TournamentStore::try_reconnect(&self.inner))
    }
}

//! In-process storage backend used for ephemeral runs and tests.

use std::{collections::BTreeMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use super::TournamentStore;
use crate::dao::{
    models::{
        NewHistoryEntry, NewTournament, NewTournamentPlayer, PlayerHistoryEntity,
        TournamentEntity, TournamentPlayerEntity, TournamentScoreEntity, UniversalPlayerEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Map-backed store; contents vanish with the process.
#[derive(Clone, Default)]
pub struct MemoryTournamentStore {
    inner: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    tournaments: BTreeMap<i64, TournamentEntity>,
    players: BTreeMap<i64, TournamentPlayerEntity>,
    /// Keyed by `(tournament_player_id, hole)`, mirroring the unique index of the database backend.
    scores: BTreeMap<(i64, u32), TournamentScoreEntity>,
    universal_players: BTreeMap<i64, UniversalPlayerEntity>,
    history: BTreeMap<i64, PlayerHistoryEntity>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryTournamentStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn create_tournament(&self, tournament: NewTournament) -> StorageResult<TournamentEntity> {
        let mut tables = self.inner.write().await;
        if tables
            .tournaments
            .values()
            .any(|existing| existing.code.eq_ignore_ascii_case(&tournament.code))
        {
            return Err(StorageError::Conflict(format!(
                "room code `{}` already in use",
                tournament.code
            )));
        }

        let now = SystemTime::now();
        let entity = TournamentEntity {
            id: tables.allocate_id(),
            code: tournament.code,
            name: tournament.name,
            director_pin: tournament.director_pin,
            is_active: true,
            is_started: false,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        tables.tournaments.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete_tournament(&self, id: i64) -> bool {
        let mut tables = self.inner.write().await;
        if tables.tournaments.remove(&id).is_none() {
            return false;
        }
        tables.players.retain(|_, player| player.tournament_id != id);
        tables.scores.retain(|_, score| score.tournament_id != id);
        true
    }

    async fn create_tournament_player(&self, player: NewTournamentPlayer) -> TournamentPlayerEntity {
        let mut tables = self.inner.write().await;
        let entity = TournamentPlayerEntity {
            id: tables.allocate_id(),
            tournament_id: player.tournament_id,
            name: player.name,
            group: player.group,
            universal_player_id: player.universal_player_id,
            did_not_finish: false,
            created_at: SystemTime::now(),
        };
        tables.players.insert(entity.id, entity.clone());
        entity
    }

    async fn relink_tournament_players(&self, from: i64, to: i64) -> u64 {
        let mut tables = self.inner.write().await;
        let mut moved = 0;
        for player in tables.players.values_mut() {
            if player.universal_player_id == Some(from) {
                player.universal_player_id = Some(to);
                moved += 1;
            }
        }
        moved
    }

    async fn create_universal_player(&self, name: String) -> UniversalPlayerEntity {
        let mut tables = self.inner.write().await;
        let now = SystemTime::now();
        let entity = UniversalPlayerEntity {
            id: tables.allocate_id(),
            name,
            created_at: now,
            updated_at: now,
        };
        tables.universal_players.insert(entity.id, entity.clone());
        entity
    }

    async fn add_history(&self, entry: NewHistoryEntry) -> PlayerHistoryEntity {
        let mut tables = self.inner.write().await;
        let entity = PlayerHistoryEntity {
            id: tables.allocate_id(),
            universal_player_id: entry.universal_player_id,
            tournament_name: entry.tournament_name,
            tournament_id: entry.tournament_id,
            played_at: entry.played_at,
            holes_played: entry.holes_played,
            total_strokes: entry.total_strokes,
            total_par: entry.total_par,
            scratches: entry.scratches,
            penalties: entry.penalties,
            source: entry.source,
        };
        tables.history.insert(entity.id, entity.clone());
        entity
    }

    async fn reassign_history(&self, from: i64, to: i64) -> u64 {
        let mut tables = self.inner.write().await;
        let mut moved = 0;
        for entry in tables.history.values_mut() {
            if entry.universal_player_id == from {
                entry.universal_player_id = to;
                moved += 1;
            }
        }
        moved
    }
}

impl TournamentStore for MemoryTournamentStore {
    fn create_tournament(
        &self,
        tournament: NewTournament,
    ) -> BoxFuture<'static, StorageResult<TournamentEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_tournament(tournament).await })
    }

    fn save_tournament(&self, tournament: TournamentEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            tables.tournaments.insert(tournament.id, tournament);
            Ok(())
        })
    }

    fn find_tournament_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables
                .tournaments
                .values()
                .find(|tournament| tournament.code.eq_ignore_ascii_case(&code))
                .cloned())
        })
    }

    fn list_tournaments(&self) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables.tournaments.values().cloned().collect())
        })
    }

    fn delete_tournament(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_tournament(id).await) })
    }

    fn create_tournament_player(
        &self,
        player: NewTournamentPlayer,
    ) -> BoxFuture<'static, StorageResult<TournamentPlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.create_tournament_player(player).await) })
    }

    fn save_tournament_player(
        &self,
        player: TournamentPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            tables.players.insert(player.id, player);
            Ok(())
        })
    }

    fn find_tournament_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables.players.get(&id).cloned())
        })
    }

    fn list_tournament_players(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables
                .players
                .values()
                .filter(|player| player.tournament_id == tournament_id)
                .cloned()
                .collect())
        })
    }

    fn list_players_for_universal(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables
                .players
                .values()
                .filter(|player| player.universal_player_id == Some(universal_player_id))
                .cloned()
                .collect())
        })
    }

    fn relink_tournament_players(
        &self,
        from: i64,
        to: i64,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.relink_tournament_players(from, to).await) })
    }

    fn upsert_score(
        &self,
        score: TournamentScoreEntity,
    ) -> BoxFuture<'static, StorageResult<TournamentScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            tables
                .scores
                .insert((score.tournament_player_id, score.hole), score.clone());
            Ok(score)
        })
    }

    fn list_scores(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables
                .scores
                .values()
                .filter(|score| score.tournament_id == tournament_id)
                .cloned()
                .collect())
        })
    }

    fn create_universal_player(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<UniversalPlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.create_universal_player(name).await) })
    }

    fn save_universal_player(
        &self,
        player: UniversalPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            tables.universal_players.insert(player.id, player);
            Ok(())
        })
    }

    fn find_universal_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<UniversalPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables.universal_players.get(&id).cloned())
        })
    }

    fn list_universal_players(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<UniversalPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables.universal_players.values().cloned().collect())
        })
    }

    fn delete_universal_player(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            Ok(tables.universal_players.remove(&id).is_some())
        })
    }

    fn add_history(
        &self,
        entry: NewHistoryEntry,
    ) -> BoxFuture<'static, StorageResult<PlayerHistoryEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.add_history(entry).await) })
    }

    fn list_history(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerHistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            let mut entries: Vec<_> = tables
                .history
                .values()
                .filter(|entry| entry.universal_player_id == universal_player_id)
                .cloned()
                .collect();
            entries.sort_by_key(|entry| (entry.played_at, entry.id));
            Ok(entries)
        })
    }

    fn delete_history(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            Ok(tables.history.remove(&id).is_some())
        })
    }

    fn reassign_history(&self, from: i64, to: i64) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.reassign_history(from, to).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(player: i64, hole: u32, strokes: u32) -> TournamentScoreEntity {
        TournamentScoreEntity {
            tournament_id: 1,
            tournament_player_id: player,
            hole,
            par: 3,
            strokes,
            scratches: 0,
            penalties: 0,
            updated_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_same_player_and_hole() {
        let store = MemoryTournamentStore::new();
        TournamentStore::upsert_score(&store, score(7, 1, 4)).await.unwrap();
        TournamentStore::upsert_score(&store, score(7, 1, 5)).await.unwrap();
        TournamentStore::upsert_score(&store, score(7, 2, 2)).await.unwrap();

        let rows = TournamentStore::list_scores(&store, 1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].strokes, 5);
        assert_eq!(rows[1].hole, 2);
    }

    #[tokio::test]
    async fn duplicate_room_code_is_a_conflict() {
        let store = MemoryTournamentStore::new();
        let new = |code: &str| NewTournament {
            code: code.into(),
            name: "Sunday putt".into(),
            director_pin: "1234".into(),
        };
        TournamentStore::create_tournament(&store, new("ABCDE")).await.unwrap();
        let err = TournamentStore::create_tournament(&store, new("abcde"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_tournament_cascades() {
        let store = MemoryTournamentStore::new();
        let tournament = TournamentStore::create_tournament(
            &store,
            NewTournament {
                code: "HOLE1".into(),
                name: "Cascade".into(),
                director_pin: "0000".into(),
            },
        )
        .await
        .unwrap();
        let player = TournamentStore::create_tournament_player(
            &store,
            NewTournamentPlayer {
                tournament_id: tournament.id,
                name: "Ada".into(),
                group: None,
                universal_player_id: None,
            },
        )
        .await
        .unwrap();
        let mut row = score(player.id, 1, 3);
        row.tournament_id = tournament.id;
        TournamentStore::upsert_score(&store, row).await.unwrap();

        assert!(TournamentStore::delete_tournament(&store, tournament.id).await.unwrap());
        assert!(
            TournamentStore::list_tournament_players(&store, tournament.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            TournamentStore::list_scores(&store, tournament.id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}

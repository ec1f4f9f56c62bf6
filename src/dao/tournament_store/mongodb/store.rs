use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoCounterDocument, MongoHistoryDocument, MongoPlayerDocument, MongoScoreDocument,
        MongoTournamentDocument, MongoUniversalPlayerDocument, doc_id, score_key,
    },
};
use crate::dao::{
    models::{
        NewHistoryEntry, NewTournament, NewTournamentPlayer, PlayerHistoryEntity,
        TournamentEntity, TournamentPlayerEntity, TournamentScoreEntity, UniversalPlayerEntity,
    },
    storage::StorageResult,
    tournament_store::TournamentStore,
};

const TOURNAMENT_COLLECTION_NAME: &str = "tournaments";
const PLAYER_COLLECTION_NAME: &str = "tournament_players";
const SCORE_COLLECTION_NAME: &str = "tournament_scores";
const UNIVERSAL_PLAYER_COLLECTION_NAME: &str = "universal_players";
const HISTORY_COLLECTION_NAME: &str = "player_history";
const COUNTER_COLLECTION_NAME: &str = "counters";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB implementation of [`TournamentStore`].
#[derive(Clone)]
pub struct MongoTournamentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoTournamentStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let indexes: [(&'static str, &'static str, Document, bool); 6] = [
            (TOURNAMENT_COLLECTION_NAME, "code", doc! {"code": 1}, true),
            (
                SCORE_COLLECTION_NAME,
                "tournament_player_id,hole",
                doc! {"tournament_player_id": 1, "hole": 1},
                true,
            ),
            (SCORE_COLLECTION_NAME, "tournament_id", doc! {"tournament_id": 1}, false),
            (PLAYER_COLLECTION_NAME, "tournament_id", doc! {"tournament_id": 1}, false),
            (
                PLAYER_COLLECTION_NAME,
                "universal_player_id",
                doc! {"universal_player_id": 1},
                false,
            ),
            (
                HISTORY_COLLECTION_NAME,
                "universal_player_id",
                doc! {"universal_player_id": 1},
                false,
            ),
        ];

        for (collection_name, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(Some(unique)).build())
                .build();
            database
                .collection::<Document>(collection_name)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: collection_name,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn tournaments(&self) -> Collection<MongoTournamentDocument> {
        self.database().await.collection(TOURNAMENT_COLLECTION_NAME)
    }

    async fn players(&self) -> Collection<MongoPlayerDocument> {
        self.database().await.collection(PLAYER_COLLECTION_NAME)
    }

    async fn scores(&self) -> Collection<MongoScoreDocument> {
        self.database().await.collection(SCORE_COLLECTION_NAME)
    }

    async fn universal_players(&self) -> Collection<MongoUniversalPlayerDocument> {
        self.database()
            .await
            .collection(UNIVERSAL_PLAYER_COLLECTION_NAME)
    }

    async fn history(&self) -> Collection<MongoHistoryDocument> {
        self.database().await.collection(HISTORY_COLLECTION_NAME)
    }

    /// Allocate the next integer id of a sequence from the counters collection.
    async fn next_id(&self, sequence: &'static str) -> MongoResult<i64> {
        let counters: Collection<MongoCounterDocument> =
            self.database().await.collection(COUNTER_COLLECTION_NAME);
        let counter = counters
            .find_one_and_update(doc! {"_id": sequence}, doc! {"$inc": {"value": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId {
                sequence,
                source: Some(source),
            })?
            .ok_or(MongoDaoError::NextId {
                sequence,
                source: None,
            })?;
        Ok(counter.value)
    }

    async fn create_tournament(&self, tournament: NewTournament) -> MongoResult<TournamentEntity> {
        let id = self.next_id(TOURNAMENT_COLLECTION_NAME).await?;
        let now = SystemTime::now();
        let entity = TournamentEntity {
            id,
            code: tournament.code,
            name: tournament.name,
            director_pin: tournament.director_pin,
            is_active: true,
            is_started: false,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };

        let document: MongoTournamentDocument = entity.clone().into();
        match self.tournaments().await.insert_one(&document).await {
            Ok(_) => Ok(entity),
            Err(err) if is_duplicate_key(&err) => Err(MongoDaoError::DuplicateCode {
                code: entity.code,
            }),
            Err(source) => Err(MongoDaoError::SaveTournament { id, source }),
        }
    }

    async fn save_tournament(&self, tournament: TournamentEntity) -> MongoResult<()> {
        let id = tournament.id;
        let document: MongoTournamentDocument = tournament.into();
        self.tournaments()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTournament { id, source })?;
        Ok(())
    }

    async fn find_tournament_by_code(&self, code: String) -> MongoResult<Option<TournamentEntity>> {
        let document = self
            .tournaments()
            .await
            .find_one(doc! {"code": code.to_ascii_uppercase()})
            .await
            .map_err(|source| MongoDaoError::LoadTournament { code, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_tournaments(&self) -> MongoResult<Vec<TournamentEntity>> {
        let documents: Vec<MongoTournamentDocument> = self
            .tournaments()
            .await
            .find(doc! {})
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListTournaments { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTournaments { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_tournament(&self, id: i64) -> MongoResult<bool> {
        let result = self
            .tournaments()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteTournament { id, source })?;
        if result.deleted_count == 0 {
            return Ok(false);
        }

        let scores = self
            .scores()
            .await
            .delete_many(doc! {"tournament_id": id})
            .await
            .map_err(|source| MongoDaoError::DeleteTournament { id, source })?;
        let players = self
            .players()
            .await
            .delete_many(doc! {"tournament_id": id})
            .await
            .map_err(|source| MongoDaoError::DeleteTournament { id, source })?;
        debug!(
            tournament_id = id,
            scores = scores.deleted_count,
            players = players.deleted_count,
            "tournament torn down"
        );
        Ok(true)
    }

    async fn create_tournament_player(
        &self,
        player: NewTournamentPlayer,
    ) -> MongoResult<TournamentPlayerEntity> {
        let id = self.next_id(PLAYER_COLLECTION_NAME).await?;
        let entity = TournamentPlayerEntity {
            id,
            tournament_id: player.tournament_id,
            name: player.name,
            group: player.group,
            universal_player_id: player.universal_player_id,
            did_not_finish: false,
            created_at: SystemTime::now(),
        };
        let document: MongoPlayerDocument = entity.clone().into();
        self.players()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SavePlayer { id, source })?;
        Ok(entity)
    }

    async fn save_tournament_player(&self, player: TournamentPlayerEntity) -> MongoResult<()> {
        let id = player.id;
        let document: MongoPlayerDocument = player.into();
        self.players()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SavePlayer { id, source })?;
        Ok(())
    }

    async fn find_players(&self, filter: Document) -> MongoResult<Vec<TournamentPlayerEntity>> {
        let documents: Vec<MongoPlayerDocument> = self
            .players()
            .await
            .find(filter)
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::LoadPlayers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadPlayers { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn relink_tournament_players(&self, from: i64, to: i64) -> MongoResult<u64> {
        let result = self
            .players()
            .await
            .update_many(
                doc! {"universal_player_id": from},
                doc! {"$set": {"universal_player_id": to}},
            )
            .await
            .map_err(|source| MongoDaoError::RelinkPlayers { from, to, source })?;
        Ok(result.modified_count)
    }

    /// Replace the row for `(player, hole)`, inserting it when absent. Two concurrent
    /// upserts for a fresh key can race on the unique index; the loser retries once and
    /// then lands as a plain replacement.
    async fn upsert_score(&self, score: TournamentScoreEntity) -> MongoResult<TournamentScoreEntity> {
        let player_id = score.tournament_player_id;
        let hole = score.hole;
        let document: MongoScoreDocument = score.clone().into();
        let collection = self.scores().await;

        let mut retried = false;
        loop {
            match collection
                .replace_one(score_key(player_id, hole), &document)
                .upsert(true)
                .await
            {
                Ok(_) => return Ok(score),
                Err(err) if is_duplicate_key(&err) && !retried => {
                    warn!(player_id, hole, "concurrent score upsert collided; retrying");
                    retried = true;
                }
                Err(source) => {
                    return Err(MongoDaoError::SaveScore {
                        player_id,
                        hole,
                        source,
                    });
                }
            }
        }
    }

    async fn list_scores(&self, tournament_id: i64) -> MongoResult<Vec<TournamentScoreEntity>> {
        let documents: Vec<MongoScoreDocument> = self
            .scores()
            .await
            .find(doc! {"tournament_id": tournament_id})
            .sort(doc! {"tournament_player_id": 1, "hole": 1})
            .await
            .map_err(|source| MongoDaoError::LoadScores {
                tournament_id,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadScores {
                tournament_id,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn create_universal_player(&self, name: String) -> MongoResult<UniversalPlayerEntity> {
        let id = self.next_id(UNIVERSAL_PLAYER_COLLECTION_NAME).await?;
        let now = SystemTime::now();
        let entity = UniversalPlayerEntity {
            id,
            name,
            created_at: now,
            updated_at: now,
        };
        let document: MongoUniversalPlayerDocument = entity.clone().into();
        self.universal_players()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveUniversalPlayer { id, source })?;
        Ok(entity)
    }

    async fn save_universal_player(&self, player: UniversalPlayerEntity) -> MongoResult<()> {
        let id = player.id;
        let document: MongoUniversalPlayerDocument = player.into();
        self.universal_players()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveUniversalPlayer { id, source })?;
        Ok(())
    }

    async fn find_universal_player(&self, id: i64) -> MongoResult<Option<UniversalPlayerEntity>> {
        let document = self
            .universal_players()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadUniversalPlayers { source })?;
        Ok(document.map(Into::into))
    }

    async fn list_universal_players(&self) -> MongoResult<Vec<UniversalPlayerEntity>> {
        let documents: Vec<MongoUniversalPlayerDocument> = self
            .universal_players()
            .await
            .find(doc! {})
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::LoadUniversalPlayers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadUniversalPlayers { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_universal_player(&self, id: i64) -> MongoResult<bool> {
        let result = self
            .universal_players()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteUniversalPlayer { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn add_history(&self, entry: NewHistoryEntry) -> MongoResult<PlayerHistoryEntity> {
        let id = self.next_id(HISTORY_COLLECTION_NAME).await?;
        let entity = PlayerHistoryEntity {
            id,
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
        let document: MongoHistoryDocument = entity.clone().into();
        self.history()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveHistory { id, source })?;
        Ok(entity)
    }

    async fn list_history(&self, universal_player_id: i64) -> MongoResult<Vec<PlayerHistoryEntity>> {
        let documents: Vec<MongoHistoryDocument> = self
            .history()
            .await
            .find(doc! {"universal_player_id": universal_player_id})
            .sort(doc! {"played_at": 1, "_id": 1})
            .await
            .map_err(|source| MongoDaoError::LoadHistory {
                universal_player_id,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadHistory {
                universal_player_id,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_history(&self, id: i64) -> MongoResult<bool> {
        let result = self
            .history()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteHistory { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn reassign_history(&self, from: i64, to: i64) -> MongoResult<u64> {
        let result = self
            .history()
            .await
            .update_many(
                doc! {"universal_player_id": from},
                doc! {"$set": {"universal_player_id": to}},
            )
            .await
            .map_err(|source| MongoDaoError::ReassignHistory { from, to, source })?;
        Ok(result.modified_count)
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl TournamentStore for MongoTournamentStore {
    fn create_tournament(
        &self,
        tournament: NewTournament,
    ) -> BoxFuture<'static, StorageResult<TournamentEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_tournament(tournament).await.map_err(Into::into) })
    }

    fn save_tournament(&self, tournament: TournamentEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_tournament(tournament).await.map_err(Into::into) })
    }

    fn find_tournament_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_tournament_by_code(code).await.map_err(Into::into) })
    }

    fn list_tournaments(&self) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_tournaments().await.map_err(Into::into) })
    }

    fn delete_tournament(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_tournament(id).await.map_err(Into::into) })
    }

    fn create_tournament_player(
        &self,
        player: NewTournamentPlayer,
    ) -> BoxFuture<'static, StorageResult<TournamentPlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_tournament_player(player).await.map_err(Into::into) })
    }

    fn save_tournament_player(
        &self,
        player: TournamentPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_tournament_player(player).await.map_err(Into::into) })
    }

    fn find_tournament_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut players = store.find_players(doc_id(id)).await?;
            Ok(players.pop())
        })
    }

    fn list_tournament_players(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_players(doc! {"tournament_id": tournament_id})
                .await
                .map_err(Into::into)
        })
    }

    fn list_players_for_universal(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_players(doc! {"universal_player_id": universal_player_id})
                .await
                .map_err(Into::into)
        })
    }

    fn relink_tournament_players(
        &self,
        from: i64,
        to: i64,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .relink_tournament_players(from, to)
                .await
                .map_err(Into::into)
        })
    }

    fn upsert_score(
        &self,
        score: TournamentScoreEntity,
    ) -> BoxFuture<'static, StorageResult<TournamentScoreEntity>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_score(score).await.map_err(Into::into) })
    }

    fn list_scores(
        &self,
        tournament_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_scores(tournament_id).await.map_err(Into::into) })
    }

    fn create_universal_player(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<UniversalPlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_universal_player(name).await.map_err(Into::into) })
    }

    fn save_universal_player(
        &self,
        player: UniversalPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_universal_player(player).await.map_err(Into::into) })
    }

    fn find_universal_player(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<UniversalPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_universal_player(id).await.map_err(Into::into) })
    }

    fn list_universal_players(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<UniversalPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_universal_players().await.map_err(Into::into) })
    }

    fn delete_universal_player(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_universal_player(id).await.map_err(Into::into) })
    }

    fn add_history(
        &self,
        entry: NewHistoryEntry,
    ) -> BoxFuture<'static, StorageResult<PlayerHistoryEntity>> {
        let store = self.clone();
        Box::pin(async move { store.add_history(entry).await.map_err(Into::into) })
    }

    fn list_history(
        &self,
        universal_player_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerHistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_history(universal_player_id).await.map_err(Into::into) })
    }

    fn delete_history(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_history(id).await.map_err(Into::into) })
    }

    fn reassign_history(&self, from: i64, to: i64) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.reassign_history(from, to).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

//! Persistent player directory: CRUD, history, statistics, merge and JSON
//! import/export.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{
    dao::{models::UniversalPlayerEntity, tournament_store::TournamentStore},
    dto::{
        directory::{
            DirectoryExport, EXPORT_VERSION, ExportedPlayer, HandicapStatsResponse,
            HistoryEntryInput, HistoryEntrySummary, ImportResult, MergePlayersRequest,
            MergePlayersResponse, UniversalPlayerRequest, UniversalPlayerSummary,
        },
        format_system_time,
        tournament::ActionResponse,
    },
    error::ServiceError,
    services::{
        handicap::compute_handicap,
        leaderboard::{ScoreTotals, totals_by_player},
    },
    state::{SharedState, lifecycle::TournamentPhase},
};

async fn find_player(
    store: &Arc<dyn TournamentStore>,
    id: i64,
) -> Result<UniversalPlayerEntity, ServiceError> {
    store
        .find_universal_player(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("directory player {id} not found")))
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

async fn room_names(store: &Arc<dyn TournamentStore>) -> Result<HashMap<i64, String>, ServiceError> {
    Ok(store
        .list_tournaments()
        .await?
        .into_iter()
        .map(|tournament| (tournament.id, tournament.name))
        .collect())
}

/// Keep a room link only when that room exists here under the entry's name.
fn keep_known_room(input: &mut HistoryEntryInput, rooms: &HashMap<i64, String>) {
    let Some(room_id) = input.tournament_id else {
        return;
    };
    let known = rooms
        .get(&room_id)
        .is_some_and(|name| name == input.tournament_name.trim());
    if !known {
        debug!(room_id, "dropping link to unknown room");
        input.tournament_id = None;
    }
}

/// Every directory player, sorted by name.
pub async fn list_players(
    state: &SharedState,
) -> Result<Vec<UniversalPlayerSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut players = store.list_universal_players().await?;
    players.sort_by(|a, b| name_key(&a.name).cmp(&name_key(&b.name)).then(a.id.cmp(&b.id)));
    Ok(players.iter().map(UniversalPlayerSummary::from).collect())
}

/// Add a player to the directory.
pub async fn create_player(
    state: &SharedState,
    request: UniversalPlayerRequest,
) -> Result<UniversalPlayerSummary, ServiceError> {
    let store = state.require_store().await?;
    let player = store
        .create_universal_player(request.name.trim().to_owned())
        .await?;
    info!(id = player.id, "directory player created");
    Ok(UniversalPlayerSummary::from(&player))
}

/// Look up one directory player.
pub async fn get_player(
    state: &SharedState,
    id: i64,
) -> Result<UniversalPlayerSummary, ServiceError> {
    let store = state.require_store().await?;
    let player = find_player(&store, id).await?;
    Ok(UniversalPlayerSummary::from(&player))
}

/// Rename a directory player.
pub async fn rename_player(
    state: &SharedState,
    id: i64,
    request: UniversalPlayerRequest,
) -> Result<UniversalPlayerSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut player = find_player(&store, id).await?;
    player.name = request.name.trim().to_owned();
    player.updated_at = SystemTime::now();
    store.save_universal_player(player.clone()).await?;
    Ok(UniversalPlayerSummary::from(&player))
}

/// Remove a directory player with its history. Room players keep playing
/// but lose the link.
pub async fn delete_player(state: &SharedState, id: i64) -> Result<ActionResponse, ServiceError> {
    let store = state.require_store().await?;
    find_player(&store, id).await?;

    for entry in store.list_history(id).await? {
        store.delete_history(entry.id).await?;
    }
    for mut player in store.list_players_for_universal(id).await? {
        player.universal_player_id = None;
        store.save_tournament_player(player).await?;
    }
    if !store.delete_universal_player(id).await? {
        return Err(ServiceError::NotFound(format!(
            "directory player {id} not found"
        )));
    }

    info!(id, "directory player deleted");
    Ok(ActionResponse {
        message: format!("directory player {id} deleted"),
    })
}

/// History entries of a directory player.
pub async fn list_history(
    state: &SharedState,
    id: i64,
) -> Result<Vec<HistoryEntrySummary>, ServiceError> {
    let store = state.require_store().await?;
    find_player(&store, id).await?;
    let history = store.list_history(id).await?;
    Ok(history.iter().map(HistoryEntrySummary::from).collect())
}

/// Record a past result typed in by hand.
pub async fn add_history(
    state: &SharedState,
    id: i64,
    mut input: HistoryEntryInput,
) -> Result<HistoryEntrySummary, ServiceError> {
    let store = state.require_store().await?;
    find_player(&store, id).await?;
    if input.tournament_id.is_some() {
        keep_known_room(&mut input, &room_names(&store).await?);
    }
    let entry = store
        .add_history(input.into_new_entry(id, SystemTime::now()))
        .await?;
    debug!(id, entry_id = entry.id, "history entry added");
    Ok(HistoryEntrySummary::from(&entry))
}

/// Remove one history entry owned by the player.
pub async fn delete_history(
    state: &SharedState,
    id: i64,
    entry_id: i64,
) -> Result<ActionResponse, ServiceError> {
    let store = state.require_store().await?;
    find_player(&store, id).await?;

    let owned = store
        .list_history(id)
        .await?
        .iter()
        .any(|entry| entry.id == entry_id);
    if !owned || !store.delete_history(entry_id).await? {
        return Err(ServiceError::NotFound(format!(
            "history entry {entry_id} not found for player {id}"
        )));
    }
    Ok(ActionResponse {
        message: format!("history entry {entry_id} deleted"),
    })
}

/// Derive PPT/PPC over archived history and rooms still in play.
pub async fn player_stats(
    state: &SharedState,
    id: i64,
) -> Result<HandicapStatsResponse, ServiceError> {
    let store = state.require_store().await?;
    let player = find_player(&store, id).await?;
    let history = store.list_history(id).await?;
    let live = live_totals(&store, id).await?;
    Ok(HandicapStatsResponse::new(
        &player,
        compute_handicap(&history, &live),
    ))
}

/// Totals of every finishing participation in a room that is not closed yet,
/// skipping rooms where no hole has been recorded.
async fn live_totals(
    store: &Arc<dyn TournamentStore>,
    universal_player_id: i64,
) -> Result<Vec<ScoreTotals>, ServiceError> {
    let linked = store.list_players_for_universal(universal_player_id).await?;
    if linked.is_empty() {
        return Ok(Vec::new());
    }

    let open_rooms: HashMap<i64, bool> = store
        .list_tournaments()
        .await?
        .iter()
        .map(|tournament| {
            (
                tournament.id,
                TournamentPhase::of(tournament).accepts_play(),
            )
        })
        .collect();

    let mut live = Vec::new();
    for player in linked {
        if player.did_not_finish || !open_rooms.get(&player.tournament_id).copied().unwrap_or(false)
        {
            continue;
        }
        let scores = store.list_scores(player.tournament_id).await?;
        if let Some(totals) = totals_by_player(&scores).remove(&player.id) {
            live.push(totals);
        }
    }
    Ok(live)
}

/// Fold `source` into `target`: history moves, room links follow, source is deleted.
pub async fn merge_players(
    state: &SharedState,
    request: MergePlayersRequest,
) -> Result<MergePlayersResponse, ServiceError> {
    if request.source_id == request.target_id {
        return Err(ServiceError::InvalidInput(
            "cannot merge a player into itself".into(),
        ));
    }

    let store = state.require_store().await?;
    find_player(&store, request.source_id).await?;
    let mut target = find_player(&store, request.target_id).await?;

    let moved_history = store
        .reassign_history(request.source_id, request.target_id)
        .await?;
    let relinked_players = store
        .relink_tournament_players(request.source_id, request.target_id)
        .await?;
    store.delete_universal_player(request.source_id).await?;

    target.updated_at = SystemTime::now();
    store.save_universal_player(target.clone()).await?;

    info!(
        source = request.source_id,
        target = request.target_id,
        moved_history,
        relinked_players,
        "directory players merged"
    );
    Ok(MergePlayersResponse {
        target: UniversalPlayerSummary::from(&target),
        moved_history,
        relinked_players,
    })
}

/// Dump the whole directory with history.
pub async fn export_directory(state: &SharedState) -> Result<DirectoryExport, ServiceError> {
    let store = state.require_store().await?;
    let mut players = store.list_universal_players().await?;
    players.sort_by_key(|player| player.id);

    let mut exported = Vec::with_capacity(players.len());
    for player in players {
        let history = store.list_history(player.id).await?;
        exported.push(ExportedPlayer {
            id: Some(player.id),
            name: player.name,
            history: history.iter().map(HistoryEntryInput::from).collect(),
        });
    }

    Ok(DirectoryExport {
        version: EXPORT_VERSION,
        exported_at: Some(format_system_time(SystemTime::now())),
        players: exported,
    })
}

/// Load an export document. Names matching an existing player, ignoring
/// case, are merged into that player instead of creating a duplicate.
pub async fn import_directory(
    state: &SharedState,
    document: DirectoryExport,
) -> Result<ImportResult, ServiceError> {
    let store = state.require_store().await?;

    let mut existing: HashMap<String, UniversalPlayerEntity> = HashMap::new();
    let mut known = store.list_universal_players().await?;
    known.sort_by_key(|player| player.id);
    for player in known {
        existing.entry(name_key(&player.name)).or_insert(player);
    }

    let mut grouped: IndexMap<String, (String, Vec<HistoryEntryInput>)> = IndexMap::new();
    for player in document.players {
        let (_, history) = grouped
            .entry(name_key(&player.name))
            .or_insert_with(|| (player.name.trim().to_owned(), Vec::new()));
        history.extend(player.history);
    }

    let rooms = room_names(&store).await?;
    let now = SystemTime::now();
    let mut result = ImportResult::default();
    for (key, (name, history)) in grouped {
        let target = match existing.get(&key) {
            Some(player) => {
                result.merged_players += 1;
                player.clone()
            }
            None => {
                result.created_players += 1;
                let player = store.create_universal_player(name).await?;
                existing.insert(key, player.clone());
                player
            }
        };

        for mut input in history {
            keep_known_room(&mut input, &rooms);
            store.add_history(input.into_new_entry(target.id, now)).await?;
            result.history_entries += 1;
        }
    }

    info!(
        created = result.created_players,
        merged = result.merged_players,
        history = result.history_entries,
        "directory imported"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::tournament_store::memory::MemoryTournamentStore,
        dto::{
            directory::HistorySourceDto, player::RegisterPlayerRequest,
            tournament::CreateTournamentRequest,
        },
        services::{registration_service, tournament_service},
        state::AppState,
    };

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_store(Arc::new(MemoryTournamentStore::new()))
            .await;
        state
    }

    fn entry(name: &str, scratches: u32, penalties: u32) -> HistoryEntryInput {
        HistoryEntryInput {
            tournament_name: name.into(),
            played_at: None,
            holes_played: 9,
            total_strokes: 30,
            total_par: 27,
            scratches,
            penalties,
            tournament_id: None,
            source: HistorySourceDto::Manual,
        }
    }

    async fn player(state: &SharedState, name: &str) -> i64 {
        create_player(state, UniversalPlayerRequest { name: name.into() })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn merge_moves_history_and_deletes_source() {
        let state = state().await;
        let source = player(&state, "Ada L").await;
        let target = player(&state, "Ada Lovelace").await;
        add_history(&state, source, entry("Spring", 1, 0)).await.unwrap();
        add_history(&state, source, entry("Summer", 0, 2)).await.unwrap();
        add_history(&state, target, entry("Autumn", 0, 0)).await.unwrap();

        let before = player_stats(&state, target).await.unwrap();
        let merged = merge_players(
            &state,
            MergePlayersRequest {
                source_id: source,
                target_id: target,
            },
        )
        .await
        .unwrap();
        assert_eq!(merged.moved_history, 2);

        let after = player_stats(&state, target).await.unwrap();
        assert_eq!(after.completed_tournaments, before.completed_tournaments + 2);
        assert!(matches!(
            get_player(&state, source).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn merging_into_itself_is_rejected() {
        let state = state().await;
        let id = player(&state, "Solo").await;
        assert!(matches!(
            merge_players(
                &state,
                MergePlayersRequest {
                    source_id: id,
                    target_id: id,
                },
            )
            .await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn stats_report_ppt() {
        let state = state().await;
        let id = player(&state, "Bob").await;
        add_history(&state, id, entry("One", 1, 1)).await.unwrap();
        add_history(&state, id, entry("Two", 0, 2)).await.unwrap();

        let stats = player_stats(&state, id).await.unwrap();
        assert_eq!(stats.infractions, 4);
        assert_eq!(stats.ppt, 2.0);
    }

    #[tokio::test]
    async fn history_entry_must_belong_to_player() {
        let state = state().await;
        let owner = player(&state, "Owner").await;
        let other = player(&state, "Other").await;
        let added = add_history(&state, owner, entry("Cup", 0, 0)).await.unwrap();

        assert!(matches!(
            delete_history(&state, other, added.id).await,
            Err(ServiceError::NotFound(_))
        ));
        delete_history(&state, owner, added.id).await.unwrap();
        assert!(list_history(&state, owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_merges_names_case_insensitively() {
        let state = state().await;
        let existing = player(&state, "Cleo").await;
        add_history(&state, existing, entry("Local", 0, 0)).await.unwrap();

        let document = DirectoryExport {
            version: EXPORT_VERSION,
            exported_at: None,
            players: vec![
                ExportedPlayer {
                    id: Some(77),
                    name: "cleo ".into(),
                    history: vec![entry("Imported", 1, 0)],
                },
                ExportedPlayer {
                    id: Some(78),
                    name: "Dmitri".into(),
                    history: vec![entry("Imported", 0, 1), entry("Older", 0, 0)],
                },
            ],
        };

        let result = import_directory(&state, document).await.unwrap();
        assert_eq!(
            result,
            ImportResult {
                created_players: 1,
                merged_players: 1,
                history_entries: 3,
            }
        );
        assert_eq!(list_players(&state).await.unwrap().len(), 2);
        assert_eq!(list_history(&state, existing).await.unwrap().len(), 2);

        let exported = export_directory(&state).await.unwrap();
        assert_eq!(exported.version, EXPORT_VERSION);
        assert_eq!(exported.players.len(), 2);
        assert_eq!(exported.players[1].name, "Dmitri");
        assert_eq!(exported.players[1].history.len(), 2);
    }

    #[tokio::test]
    async fn room_links_survive_a_round_trip_and_foreign_links_are_dropped() {
        let state = state().await;
        let member = player(&state, "Edda").await;
        tournament_service::create_tournament(
            &state,
            CreateTournamentRequest {
                name: "Riverside".into(),
                director_pin: "8080".into(),
                code: Some("RIVER".into()),
            },
        )
        .await
        .unwrap();
        registration_service::register_player(
            &state,
            "RIVER",
            RegisterPlayerRequest {
                name: "Edda".into(),
                group: None,
                universal_player_id: Some(member),
            },
        )
        .await
        .unwrap();
        tournament_service::close_tournament(&state, "RIVER", Some("8080"))
            .await
            .unwrap();
        let room_id = list_history(&state, member).await.unwrap()[0]
            .tournament_id
            .unwrap();

        let mut document = export_directory(&state).await.unwrap();
        let mut foreign = entry("Elsewhere", 0, 0);
        foreign.tournament_id = Some(room_id + 100);
        document.players[0].history.push(foreign);
        delete_player(&state, member).await.unwrap();

        import_directory(&state, document).await.unwrap();
        let restored = list_players(&state).await.unwrap()[0].id;
        let history = list_history(&state, restored).await.unwrap();
        assert_eq!(history.len(), 2);
        let archived = history
            .iter()
            .find(|entry| entry.tournament_name == "Riverside")
            .unwrap();
        assert_eq!(archived.tournament_id, Some(room_id));
        assert_eq!(archived.source, HistorySourceDto::Tournament);
        let other = history
            .iter()
            .find(|entry| entry.tournament_name == "Elsewhere")
            .unwrap();
        assert_eq!(other.tournament_id, None);
    }
}

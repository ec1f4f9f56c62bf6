//! Player registration into a room and director edits of registered players.

use std::sync::Arc;

use tracing::info;

use crate::{
    dao::{
        models::{NewTournamentPlayer, TournamentEntity, TournamentPlayerEntity},
        tournament_store::TournamentStore,
    },
    dto::player::{
        RegisterPlayerRequest, SetDnfRequest, TournamentPlayerSummary, UpdatePlayerRequest,
    },
    error::ServiceError,
    services::{sse_events, tournament_service},
    state::{SharedState, lifecycle::TournamentPhase},
};

fn ensure_open(tournament: &TournamentEntity) -> Result<(), ServiceError> {
    if TournamentPhase::of(tournament).accepts_play() {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "tournament {} is closed",
            tournament.code
        )))
    }
}

fn normalize_group(group: Option<String>) -> Option<String> {
    group
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Add a player to a room that is not closed yet.
pub async fn register_player(
    state: &SharedState,
    code: &str,
    request: RegisterPlayerRequest,
) -> Result<TournamentPlayerSummary, ServiceError> {
    let (store, tournament) = tournament_service::load_room(state, code).await?;
    ensure_open(&tournament)?;

    if let Some(universal_player_id) = request.universal_player_id {
        if store
            .find_universal_player(universal_player_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "directory player {universal_player_id} not found"
            )));
        }
    }

    let player = store
        .create_tournament_player(NewTournamentPlayer {
            tournament_id: tournament.id,
            name: request.name.trim().to_owned(),
            group: normalize_group(request.group),
            universal_player_id: request.universal_player_id,
        })
        .await?;
    info!(code = %tournament.code, player_id = player.id, "player registered");

    let summary = TournamentPlayerSummary::from(&player);
    sse_events::broadcast_player_registered(state, &tournament.code, summary.clone());
    sse_events::refresh_leaderboard(state, &store, &tournament).await;
    Ok(summary)
}

/// Players registered in a room, in registration order.
pub async fn list_players(
    state: &SharedState,
    code: &str,
) -> Result<Vec<TournamentPlayerSummary>, ServiceError> {
    let (store, tournament) = tournament_service::load_room(state, code).await?;
    let players = store.list_tournament_players(tournament.id).await?;
    Ok(players.iter().map(TournamentPlayerSummary::from).collect())
}

/// Director edit of a player's name or group.
pub async fn update_player(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
    player_id: i64,
    request: UpdatePlayerRequest,
) -> Result<TournamentPlayerSummary, ServiceError> {
    let (store, tournament) = tournament_service::load_authorized(state, code, pin).await?;
    let mut player = find_room_player(&store, &tournament, player_id).await?;

    if let Some(name) = request.name {
        player.name = name.trim().to_owned();
    }
    if let Some(group) = request.group {
        player.group = normalize_group(group);
    }
    save_and_broadcast(state, &store, &tournament, player).await
}

/// Director toggle of the did-not-finish flag.
pub async fn set_did_not_finish(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
    player_id: i64,
    request: SetDnfRequest,
) -> Result<TournamentPlayerSummary, ServiceError> {
    let (store, tournament) = tournament_service::load_authorized(state, code, pin).await?;
    let mut player = find_room_player(&store, &tournament, player_id).await?;
    player.did_not_finish = request.did_not_finish;
    info!(
        code = %tournament.code,
        player_id,
        did_not_finish = request.did_not_finish,
        "player DNF flag changed"
    );
    save_and_broadcast(state, &store, &tournament, player).await
}

/// Look a player up and make sure it belongs to the room.
pub(crate) async fn find_room_player(
    store: &Arc<dyn TournamentStore>,
    tournament: &TournamentEntity,
    player_id: i64,
) -> Result<TournamentPlayerEntity, ServiceError> {
    match store.find_tournament_player(player_id).await? {
        Some(player) if player.tournament_id == tournament.id => Ok(player),
        _ => Err(ServiceError::NotFound(format!(
            "player {player_id} not found in tournament {}",
            tournament.code
        ))),
    }
}

async fn save_and_broadcast(
    state: &SharedState,
    store: &Arc<dyn TournamentStore>,
    tournament: &TournamentEntity,
    player: TournamentPlayerEntity,
) -> Result<TournamentPlayerSummary, ServiceError> {
    store.save_tournament_player(player.clone()).await?;
    let summary = TournamentPlayerSummary::from(&player);
    sse_events::broadcast_player_updated(state, &tournament.code, summary.clone());
    sse_events::refresh_leaderboard(state, store, tournament).await;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::tournament_store::{faulty::FaultyTournamentStore, memory::MemoryTournamentStore},
        dto::tournament::CreateTournamentRequest,
        state::AppState,
    };

    async fn room() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_store(Arc::new(MemoryTournamentStore::new()))
            .await;
        tournament_service::create_tournament(
            &state,
            CreateTournamentRequest {
                name: "Pier mini golf".into(),
                director_pin: "1357".into(),
                code: Some("PIER1".into()),
            },
        )
        .await
        .unwrap();
        state
    }

    fn register(name: &str) -> RegisterPlayerRequest {
        RegisterPlayerRequest {
            name: name.into(),
            group: Some("  ".into()),
            universal_player_id: None,
        }
    }

    #[tokio::test]
    async fn registration_trims_name_and_drops_blank_group() {
        let state = room().await;
        let player = register_player(&state, "pier1", register("  Ada "))
            .await
            .unwrap();
        assert_eq!(player.name, "Ada");
        assert_eq!(player.group, None);
        assert_eq!(list_players(&state, "PIER1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_directory_link_is_rejected() {
        let state = room().await;
        let mut request = register("Bob");
        request.universal_player_id = Some(404);
        assert!(matches!(
            register_player(&state, "PIER1", request).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn closed_room_rejects_registration() {
        let state = room().await;
        tournament_service::close_tournament(&state, "PIER1", Some("1357"))
            .await
            .unwrap();
        assert!(matches!(
            register_player(&state, "PIER1", register("Late")).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn director_can_flag_dnf_and_clear_group() {
        let state = room().await;
        let mut request = register("Cleo");
        request.group = Some("Blue".into());
        let player = register_player(&state, "PIER1", request).await.unwrap();
        assert_eq!(player.group.as_deref(), Some("Blue"));

        let updated = update_player(
            &state,
            "PIER1",
            Some("1357"),
            player.id,
            UpdatePlayerRequest {
                name: None,
                group: Some(None),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.group, None);

        let flagged = set_did_not_finish(
            &state,
            "PIER1",
            Some("1357"),
            player.id,
            SetDnfRequest {
                did_not_finish: true,
            },
        )
        .await
        .unwrap();
        assert!(flagged.did_not_finish);

        assert!(matches!(
            set_did_not_finish(
                &state,
                "PIER1",
                None,
                player.id,
                SetDnfRequest {
                    did_not_finish: false
                },
            )
            .await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn registration_survives_a_failed_leaderboard_refresh() {
        let store = FaultyTournamentStore::new();
        let state = AppState::new(AppConfig::default());
        state.set_store(Arc::new(store.clone())).await;
        tournament_service::create_tournament(
            &state,
            CreateTournamentRequest {
                name: "Pier mini golf".into(),
                director_pin: "1357".into(),
                code: Some("PIER2".into()),
            },
        )
        .await
        .unwrap();
        let _receiver = state.rooms().subscribe("PIER2");

        store.fail("list_tournament_players");
        let player = register_player(&state, "PIER2", register("Dora"))
            .await
            .unwrap();
        assert_eq!(player.name, "Dora");

        store.heal();
        assert_eq!(list_players(&state, "PIER2").await.unwrap().len(), 1);
    }
}

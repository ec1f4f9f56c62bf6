//! Business logic behind the tournament room routes: creation with room code
//! allocation, director PIN checks, lifecycle transitions and archiving.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{
            HistorySource, NewHistoryEntry, NewTournament, TournamentEntity,
            TournamentPlayerEntity, TournamentScoreEntity,
        },
        tournament_store::TournamentStore,
    },
    dto::tournament::{
        ActionResponse, CloseTournamentResponse, CreateTournamentRequest, TournamentDetails,
        TournamentSummary, UpdateTournamentRequest,
    },
    error::ServiceError,
    services::{
        leaderboard::{compute_leaderboard, totals_by_player},
        sse_events,
    },
    state::{
        SharedState,
        lifecycle::{TournamentEvent, TournamentPhase},
        room_code::RoomCode,
    },
};

const MAX_CODE_ATTEMPTS: usize = 8;

/// Resolve a room code into the stored tournament.
pub async fn load_room(
    state: &SharedState,
    code: &str,
) -> Result<(Arc<dyn TournamentStore>, TournamentEntity), ServiceError> {
    let code = RoomCode::parse(code)?;
    let store = state.require_store().await?;
    let Some(tournament) = store.find_tournament_by_code(code.into_inner()).await? else {
        return Err(ServiceError::NotFound("tournament not found".into()));
    };
    Ok((store, tournament))
}

/// Check the `X-Director-Pin` value against the room's PIN.
pub fn authorize(tournament: &TournamentEntity, pin: Option<&str>) -> Result<(), ServiceError> {
    match pin {
        None => Err(ServiceError::Unauthorized("missing director PIN".into())),
        Some(pin) if pin.trim() == tournament.director_pin => Ok(()),
        Some(_) => Err(ServiceError::Unauthorized("invalid director PIN".into())),
    }
}

/// Load a room and require the director PIN.
pub async fn load_authorized(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
) -> Result<(Arc<dyn TournamentStore>, TournamentEntity), ServiceError> {
    let (store, tournament) = load_room(state, code).await?;
    authorize(&tournament, pin)?;
    Ok((store, tournament))
}

async fn details(
    state: &SharedState,
    store: &Arc<dyn TournamentStore>,
    tournament: &TournamentEntity,
) -> Result<TournamentDetails, ServiceError> {
    let player_count = store.list_tournament_players(tournament.id).await?.len();
    let archived_at = match TournamentPhase::of(tournament) {
        TournamentPhase::Closed => Some(crate::dto::format_system_time(tournament.updated_at)),
        _ => None,
    };
    Ok(TournamentDetails {
        tournament: tournament.into(),
        player_count,
        refresh_interval_secs: state.config().refresh_interval_secs,
        archived_at,
    })
}

/// Open a new room, generating a code when the director did not pick one.
pub async fn create_tournament(
    state: &SharedState,
    request: CreateTournamentRequest,
) -> Result<TournamentDetails, ServiceError> {
    let store = state.require_store().await?;
    let name = request.name.trim().to_owned();

    let tournament = match request.code.as_deref() {
        Some(code) => {
            let code = RoomCode::parse(code)?;
            store
                .create_tournament(NewTournament {
                    code: code.into_inner(),
                    name,
                    director_pin: request.director_pin,
                })
                .await?
        }
        None => create_with_generated_code(state, &store, name, request.director_pin).await?,
    };

    info!(code = %tournament.code, id = tournament.id, "tournament created");
    details(state, &store, &tournament).await
}

async fn create_with_generated_code(
    state: &SharedState,
    store: &Arc<dyn TournamentStore>,
    name: String,
    director_pin: String,
) -> Result<TournamentEntity, ServiceError> {
    let length = state.config().room_code_length;
    for attempt in 0..MAX_CODE_ATTEMPTS {
        let code = RoomCode::generate(&mut rand::rng(), length);
        match store
            .create_tournament(NewTournament {
                code: code.into_inner(),
                name: name.clone(),
                director_pin: director_pin.clone(),
            })
            .await
        {
            Ok(tournament) => return Ok(tournament),
            Err(err) => match ServiceError::from(err) {
                ServiceError::Conflict(message) => {
                    debug!(attempt, %message, "generated room code collided; retrying");
                }
                other => return Err(other),
            },
        }
    }
    Err(ServiceError::Conflict(
        "could not allocate a free room code".into(),
    ))
}

/// Every room, newest first.
pub async fn list_tournaments(state: &SharedState) -> Result<Vec<TournamentSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut tournaments = store.list_tournaments().await?;
    tournaments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(tournaments.iter().map(TournamentSummary::from).collect())
}

/// Public details of one room.
pub async fn get_tournament(
    state: &SharedState,
    code: &str,
) -> Result<TournamentDetails, ServiceError> {
    let (store, tournament) = load_room(state, code).await?;
    details(state, &store, &tournament).await
}

/// Confirm a director PIN without changing anything.
pub async fn verify_pin(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
) -> Result<ActionResponse, ServiceError> {
    let (_, tournament) = load_authorized(state, code, pin).await?;
    Ok(ActionResponse {
        message: format!("director PIN accepted for {}", tournament.code),
    })
}

/// Director rename; allowed in any phase.
pub async fn rename_tournament(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
    request: UpdateTournamentRequest,
) -> Result<TournamentSummary, ServiceError> {
    let (store, mut tournament) = load_authorized(state, code, pin).await?;
    tournament.name = request.name.trim().to_owned();
    tournament.updated_at = SystemTime::now();
    store.save_tournament(tournament.clone()).await?;

    let summary = TournamentSummary::from(&tournament);
    sse_events::broadcast_tournament_status(state, summary.clone());
    Ok(summary)
}

/// Move an active room to `Started`.
pub async fn start_tournament(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
) -> Result<TournamentSummary, ServiceError> {
    let (store, tournament) = load_authorized(state, code, pin).await?;
    let tournament = transition(&store, tournament, TournamentEvent::Start).await?;
    info!(code = %tournament.code, "tournament started");

    let summary = TournamentSummary::from(&tournament);
    sse_events::broadcast_tournament_status(state, summary.clone());
    Ok(summary)
}

/// Close a room and archive one history entry per linked, finishing player.
///
/// History is written before the phase is saved, so a close interrupted by a
/// storage failure leaves the room open and can be retried.
pub async fn close_tournament(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
) -> Result<CloseTournamentResponse, ServiceError> {
    let (store, tournament) = load_authorized(state, code, pin).await?;
    TournamentPhase::of(&tournament).next(TournamentEvent::Close)?;

    let players = store.list_tournament_players(tournament.id).await?;
    let scores = store.list_scores(tournament.id).await?;
    let leaderboard = compute_leaderboard(&players, &scores);
    let archived_entries =
        archive_results(&store, &tournament, &players, &scores, SystemTime::now()).await?;

    let tournament = transition(&store, tournament, TournamentEvent::Close).await?;
    info!(code = %tournament.code, archived_entries, "tournament closed");

    let summary = TournamentSummary::from(&tournament);
    sse_events::broadcast_tournament_status(state, summary.clone());
    Ok(CloseTournamentResponse {
        tournament: summary,
        archived_entries,
        leaderboard,
    })
}

/// Append a `Tournament` history entry for every finishing player linked to
/// the directory. Players already holding an entry for this room are skipped.
async fn archive_results(
    store: &Arc<dyn TournamentStore>,
    tournament: &TournamentEntity,
    players: &[TournamentPlayerEntity],
    scores: &[TournamentScoreEntity],
    played_at: SystemTime,
) -> Result<usize, ServiceError> {
    let totals = totals_by_player(scores);
    let mut archived_entries = 0;
    for player in players.iter().filter(|player| !player.did_not_finish) {
        let Some(universal_player_id) = player.universal_player_id else {
            continue;
        };
        if store.find_universal_player(universal_player_id).await?.is_none() {
            warn!(
                code = %tournament.code,
                player_id = player.id,
                universal_player_id,
                "linked directory player is gone; skipping archive"
            );
            continue;
        }
        let already_archived = store
            .list_history(universal_player_id)
            .await?
            .iter()
            .any(|entry| entry.tournament_id == Some(tournament.id));
        if already_archived {
            debug!(code = %tournament.code, universal_player_id, "result already archived");
            archived_entries += 1;
            continue;
        }

        let player_totals = totals.get(&player.id).copied().unwrap_or_default();
        store
            .add_history(NewHistoryEntry {
                universal_player_id,
                tournament_name: tournament.name.clone(),
                tournament_id: Some(tournament.id),
                played_at,
                holes_played: player_totals.holes,
                total_strokes: player_totals.strokes,
                total_par: player_totals.par,
                scratches: player_totals.scratches,
                penalties: player_totals.penalties,
                source: HistorySource::Tournament,
            })
            .await?;
        archived_entries += 1;
    }
    Ok(archived_entries)
}

/// Tear a room down together with its players and scores.
pub async fn delete_tournament(
    state: &SharedState,
    code: &str,
    pin: Option<&str>,
) -> Result<ActionResponse, ServiceError> {
    let (store, tournament) = load_authorized(state, code, pin).await?;
    if !store.delete_tournament(tournament.id).await? {
        return Err(ServiceError::NotFound("tournament not found".into()));
    }
    state.rooms().remove(&tournament.code);
    info!(code = %tournament.code, "tournament deleted");
    Ok(ActionResponse {
        message: format!("tournament {} deleted", tournament.code),
    })
}

async fn transition(
    store: &Arc<dyn TournamentStore>,
    mut tournament: TournamentEntity,
    event: TournamentEvent,
) -> Result<TournamentEntity, ServiceError> {
    let next = TournamentPhase::of(&tournament).next(event)?;
    next.apply_to(&mut tournament);
    tournament.updated_at = SystemTime::now();
    store.save_tournament(tournament.clone()).await?;
    debug!(code = %tournament.code, phase = next.as_str(), "tournament transitioned");
    Ok(tournament)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::tournament_store::{faulty::FaultyTournamentStore, memory::MemoryTournamentStore},
        dto::{
            directory::UniversalPlayerRequest, player::RegisterPlayerRequest,
            tournament::PhaseDto,
        },
        services::{directory_service, registration_service},
        state::AppState,
    };

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_store(Arc::new(MemoryTournamentStore::new()))
            .await;
        state
    }

    fn request(code: Option<&str>) -> CreateTournamentRequest {
        CreateTournamentRequest {
            name: " Harbour course ".into(),
            director_pin: "2468".into(),
            code: code.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn generated_codes_use_configured_length() {
        let state = state().await;
        let created = create_tournament(&state, request(None)).await.unwrap();
        assert_eq!(created.tournament.code.len(), 5);
        assert_eq!(created.tournament.name, "Harbour course");
        assert_eq!(created.tournament.phase, PhaseDto::Active);
        assert_eq!(created.refresh_interval_secs, 10);
    }

    #[tokio::test]
    async fn chosen_code_is_normalised_and_unique() {
        let state = state().await;
        let created = create_tournament(&state, request(Some("putt7")))
            .await
            .unwrap();
        assert_eq!(created.tournament.code, "PUTT7");
        assert!(matches!(
            create_tournament(&state, request(Some("PUTT7"))).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn director_actions_check_the_pin() {
        let state = state().await;
        create_tournament(&state, request(Some("PIN01"))).await.unwrap();

        assert!(matches!(
            start_tournament(&state, "PIN01", None).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            start_tournament(&state, "PIN01", Some("0000")).await,
            Err(ServiceError::Unauthorized(_))
        ));
        let started = start_tournament(&state, "PIN01", Some("2468"))
            .await
            .unwrap();
        assert_eq!(started.phase, PhaseDto::Started);
    }

    #[tokio::test]
    async fn closed_rooms_cannot_restart() {
        let state = state().await;
        create_tournament(&state, request(Some("DONE1"))).await.unwrap();
        let closed = close_tournament(&state, "DONE1", Some("2468"))
            .await
            .unwrap();
        assert_eq!(closed.tournament.phase, PhaseDto::Closed);
        assert_eq!(closed.archived_entries, 0);

        assert!(matches!(
            start_tournament(&state, "DONE1", Some("2468")).await,
            Err(ServiceError::InvalidState(_))
        ));
        let details = get_tournament(&state, "DONE1").await.unwrap();
        assert!(details.archived_at.is_some());
    }

    #[tokio::test]
    async fn malformed_code_is_invalid_input() {
        let state = state().await;
        assert!(matches!(
            get_tournament(&state, "a!").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn interrupted_close_keeps_the_room_open_and_can_be_retried() {
        let store = FaultyTournamentStore::new();
        let state = AppState::new(AppConfig::default());
        state.set_store(Arc::new(store.clone())).await;
        create_tournament(&state, request(Some("RETRY"))).await.unwrap();

        let mut directory_ids = Vec::new();
        for name in ["Ada", "Bea"] {
            let member = directory_service::create_player(
                &state,
                UniversalPlayerRequest { name: name.into() },
            )
            .await
            .unwrap();
            registration_service::register_player(
                &state,
                "RETRY",
                RegisterPlayerRequest {
                    name: name.into(),
                    group: None,
                    universal_player_id: Some(member.id),
                },
            )
            .await
            .unwrap();
            directory_ids.push(member.id);
        }

        store.allow_history_inserts(1);
        assert!(matches!(
            close_tournament(&state, "RETRY", Some("2468")).await,
            Err(ServiceError::Unavailable(_))
        ));
        let details = get_tournament(&state, "RETRY").await.unwrap();
        assert_eq!(details.tournament.phase, PhaseDto::Active);

        store.heal();
        let closed = close_tournament(&state, "RETRY", Some("2468"))
            .await
            .unwrap();
        assert_eq!(closed.tournament.phase, PhaseDto::Closed);
        assert_eq!(closed.archived_entries, 2);
        for id in directory_ids {
            let history = directory_service::list_history(&state, id).await.unwrap();
            assert_eq!(history.len(), 1);
        }
    }
}

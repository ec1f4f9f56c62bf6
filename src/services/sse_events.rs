use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::{
    dao::{models::TournamentEntity, storage::StorageError, tournament_store::TournamentStore},
    dto::{
        leaderboard::LeaderboardEntry,
        player::TournamentPlayerSummary,
        score::ScoreSummary,
        sse::{
            LeaderboardEvent, PlayerRegisteredEvent, PlayerUpdatedEvent, ScoreSubmittedEvent,
            ServerEvent, TournamentStatusEvent,
        },
        tournament::TournamentSummary,
    },
    services::leaderboard::compute_leaderboard,
    state::SharedState,
};

/// Event name of a stored score row.
pub const EVENT_SCORE_SUBMITTED: &str = "score.submitted";
/// Event name of a leaderboard snapshot.
pub const EVENT_LEADERBOARD: &str = "leaderboard";
/// Event name of a new registration.
pub const EVENT_PLAYER_REGISTERED: &str = "player.registered";
/// Event name of a director edit of a player.
pub const EVENT_PLAYER_UPDATED: &str = "player.updated";
/// Event name of a room name or phase change.
pub const EVENT_TOURNAMENT_STATUS: &str = "tournament.status";

/// Broadcast a freshly stored score row.
pub fn broadcast_score_submitted(state: &SharedState, code: &str, score: ScoreSummary) {
    send_room_event(
        state,
        code,
        EVENT_SCORE_SUBMITTED,
        &ScoreSubmittedEvent { score },
    );
}

/// Broadcast the recomputed leaderboard of a room.
pub fn broadcast_leaderboard(state: &SharedState, code: &str, entries: Vec<LeaderboardEntry>) {
    send_room_event(state, code, EVENT_LEADERBOARD, &leaderboard_event(code, entries));
}

/// Recompute a room's leaderboard and broadcast it once a write has landed.
///
/// Read failures are logged and swallowed: the caller's write is already
/// committed and must still be reported as such.
pub async fn refresh_leaderboard(
    state: &SharedState,
    store: &Arc<dyn TournamentStore>,
    tournament: &TournamentEntity,
) {
    if !state.rooms().has_subscribers(&tournament.code) {
        return;
    }
    let standings = async {
        let players = store.list_tournament_players(tournament.id).await?;
        let scores = store.list_scores(tournament.id).await?;
        Ok::<_, StorageError>(compute_leaderboard(&players, &scores))
    }
    .await;
    match standings {
        Ok(entries) => broadcast_leaderboard(state, &tournament.code, entries),
        Err(err) => warn!(
            code = %tournament.code,
            error = %err,
            "failed to refresh leaderboard after write"
        ),
    }
}

/// Broadcast that a player joined the room.
pub fn broadcast_player_registered(
    state: &SharedState,
    code: &str,
    player: TournamentPlayerSummary,
) {
    send_room_event(
        state,
        code,
        EVENT_PLAYER_REGISTERED,
        &PlayerRegisteredEvent { player },
    );
}

/// Broadcast a director edit of a player.
pub fn broadcast_player_updated(state: &SharedState, code: &str, player: TournamentPlayerSummary) {
    send_room_event(
        state,
        code,
        EVENT_PLAYER_UPDATED,
        &PlayerUpdatedEvent { player },
    );
}

/// Broadcast the room's name or phase after a change.
pub fn broadcast_tournament_status(state: &SharedState, tournament: TournamentSummary) {
    let code = tournament.code.clone();
    send_room_event(
        state,
        &code,
        EVENT_TOURNAMENT_STATUS,
        &TournamentStatusEvent(tournament),
    );
}

/// Leaderboard payload as sent on the wire, shared with the connect snapshot.
pub fn leaderboard_event(code: &str, entries: Vec<LeaderboardEntry>) -> LeaderboardEvent {
    LeaderboardEvent {
        tournament_code: code.to_owned(),
        entries,
    }
}

fn send_room_event(state: &SharedState, code: &str, event: &str, payload: &impl Serialize) {
    if !state.rooms().has_subscribers(code) {
        return;
    }
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => state.rooms().broadcast(code, message),
        Err(err) => warn!(code, event, error = %err, "failed to serialize room SSE payload"),
    }
}

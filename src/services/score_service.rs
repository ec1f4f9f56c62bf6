//! Score sync: last-write-wins upsert of `(player, hole)` rows and leaderboard reads.

use std::time::SystemTime;

use tracing::debug;

use crate::{
    dao::models::TournamentScoreEntity,
    dto::{
        leaderboard::LeaderboardResponse,
        score::{ScoreSummary, SubmitScoreRequest},
    },
    error::ServiceError,
    services::{
        leaderboard::compute_leaderboard, registration_service::find_room_player, sse_events,
        tournament_service,
    },
    state::{SharedState, lifecycle::TournamentPhase},
};

/// Store a hole for a player of the room, replacing any earlier submission.
pub async fn submit_score(
    state: &SharedState,
    code: &str,
    request: SubmitScoreRequest,
) -> Result<ScoreSummary, ServiceError> {
    let max_holes = state.config().max_holes;
    if request.hole == 0 || request.hole > max_holes {
        return Err(ServiceError::InvalidInput(format!(
            "hole must be between 1 and {max_holes}"
        )));
    }

    let (store, tournament) = tournament_service::load_room(state, code).await?;
    if !TournamentPhase::of(&tournament).accepts_play() {
        return Err(ServiceError::InvalidState(format!(
            "tournament {} is closed; scores are read-only",
            tournament.code
        )));
    }
    let player = find_room_player(&store, &tournament, request.tournament_player_id).await?;

    let stored = store
        .upsert_score(TournamentScoreEntity {
            tournament_id: tournament.id,
            tournament_player_id: player.id,
            hole: request.hole,
            par: request.par,
            strokes: request.strokes,
            scratches: request.scratches,
            penalties: request.penalties,
            updated_at: SystemTime::now(),
        })
        .await?;
    debug!(
        code = %tournament.code,
        player_id = player.id,
        hole = stored.hole,
        strokes = stored.strokes,
        "score stored"
    );

    let summary = ScoreSummary::from(&stored);
    sse_events::broadcast_score_submitted(state, &tournament.code, summary.clone());
    sse_events::refresh_leaderboard(state, &store, &tournament).await;
    Ok(summary)
}

/// All stored rows of a room, ordered by player then hole.
pub async fn list_scores(state: &SharedState, code: &str) -> Result<Vec<ScoreSummary>, ServiceError> {
    let (store, tournament) = tournament_service::load_room(state, code).await?;
    let mut scores = store.list_scores(tournament.id).await?;
    scores.sort_by_key(|score| (score.tournament_player_id, score.hole));
    Ok(scores.iter().map(ScoreSummary::from).collect())
}

/// Current standings of a room.
pub async fn leaderboard(
    state: &SharedState,
    code: &str,
) -> Result<LeaderboardResponse, ServiceError> {
    let (store, tournament) = tournament_service::load_room(state, code).await?;
    let players = store.list_tournament_players(tournament.id).await?;
    let scores = store.list_scores(tournament.id).await?;
    Ok(LeaderboardResponse {
        tournament_code: tournament.code,
        entries: compute_leaderboard(&players, &scores),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::tournament_store::{faulty::FaultyTournamentStore, memory::MemoryTournamentStore},
        dto::{player::RegisterPlayerRequest, tournament::CreateTournamentRequest},
        services::registration_service,
        state::AppState,
    };

    async fn room_with_player() -> (SharedState, i64) {
        let state = AppState::new(AppConfig::default());
        state
            .set_store(Arc::new(MemoryTournamentStore::new()))
            .await;
        tournament_service::create_tournament(
            &state,
            CreateTournamentRequest {
                name: "Lakeside".into(),
                director_pin: "9999".into(),
                code: Some("LAKE1".into()),
            },
        )
        .await
        .unwrap();
        let player = registration_service::register_player(
            &state,
            "LAKE1",
            RegisterPlayerRequest {
                name: "Ada".into(),
                group: None,
                universal_player_id: None,
            },
        )
        .await
        .unwrap();
        (state, player.id)
    }

    fn hole(player_id: i64, hole: u32, par: u32, strokes: u32) -> SubmitScoreRequest {
        SubmitScoreRequest {
            tournament_player_id: player_id,
            hole,
            par,
            strokes,
            scratches: 0,
            penalties: 0,
        }
    }

    #[tokio::test]
    async fn resubmission_overwrites_the_hole() {
        let (state, player_id) = room_with_player().await;
        submit_score(&state, "LAKE1", hole(player_id, 1, 3, 4))
            .await
            .unwrap();
        submit_score(&state, "LAKE1", hole(player_id, 1, 3, 5))
            .await
            .unwrap();

        assert_eq!(list_scores(&state, "LAKE1").await.unwrap().len(), 1);
        let board = leaderboard(&state, "LAKE1").await.unwrap();
        let entry = &board.entries[0];
        assert_eq!(entry.total_strokes, 5);
        assert_eq!(entry.relative_to_par, 2);
        assert_eq!(entry.holes_completed, 1);
    }

    #[tokio::test]
    async fn hole_beyond_configured_course_is_rejected() {
        let (state, player_id) = room_with_player().await;
        assert!(matches!(
            submit_score(&state, "LAKE1", hole(player_id, 19, 3, 4)).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn player_of_another_room_is_not_found() {
        let (state, _) = room_with_player().await;
        assert!(matches!(
            submit_score(&state, "LAKE1", hole(9_999, 1, 3, 4)).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn closed_room_rejects_scores() {
        let (state, player_id) = room_with_player().await;
        tournament_service::close_tournament(&state, "LAKE1", Some("9999"))
            .await
            .unwrap();
        assert!(matches!(
            submit_score(&state, "LAKE1", hole(player_id, 2, 3, 3)).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn subscribers_receive_score_then_leaderboard() {
        let (state, player_id) = room_with_player().await;
        let mut receiver = state.rooms().subscribe("LAKE1");
        submit_score(&state, "LAKE1", hole(player_id, 1, 3, 3))
            .await
            .unwrap();

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some(sse_events::EVENT_SCORE_SUBMITTED));
        assert_eq!(second.event.as_deref(), Some(sse_events::EVENT_LEADERBOARD));
    }

    #[tokio::test]
    async fn stored_score_is_reported_even_when_leaderboard_refresh_fails() {
        let store = FaultyTournamentStore::new();
        let state = AppState::new(AppConfig::default());
        state.set_store(Arc::new(store.clone())).await;
        tournament_service::create_tournament(
            &state,
            CreateTournamentRequest {
                name: "Harbour".into(),
                director_pin: "4242".into(),
                code: Some("HARB1".into()),
            },
        )
        .await
        .unwrap();
        let player = registration_service::register_player(
            &state,
            "HARB1",
            RegisterPlayerRequest {
                name: "Grace".into(),
                group: None,
                universal_player_id: None,
            },
        )
        .await
        .unwrap();
        let mut receiver = state.rooms().subscribe("HARB1");

        store.fail("list_scores");
        let summary = submit_score(&state, "HARB1", hole(player.id, 1, 3, 4))
            .await
            .unwrap();
        assert_eq!(summary.strokes, 4);
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(sse_events::EVENT_SCORE_SUBMITTED));
        assert!(receiver.try_recv().is_err());

        store.heal();
        assert_eq!(list_scores(&state, "HARB1").await.unwrap().len(), 1);
    }
}

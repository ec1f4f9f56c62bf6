use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        leaderboard::LeaderboardResponse,
        player::{
            RegisterPlayerRequest, SetDnfRequest, TournamentPlayerSummary, UpdatePlayerRequest,
        },
        score::{ScoreSummary, SubmitScoreRequest},
        tournament::{
            ActionResponse, CloseTournamentResponse, CreateTournamentRequest, TournamentDetails,
            TournamentSummary, UpdateTournamentRequest,
        },
    },
    error::AppError,
    services::{registration_service, score_service, tournament_service},
    state::SharedState,
};

const DIRECTOR_PIN_HEADER: &str = "x-director-pin";

fn director_pin(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(DIRECTOR_PIN_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Tournament rooms, their players and their scores.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/tournaments",
            get(list_tournaments).post(create_tournament),
        )
        .route(
            "/tournaments/{code}",
            get(get_tournament)
                .put(rename_tournament)
                .delete(delete_tournament),
        )
        .route("/tournaments/{code}/verify", post(verify_pin))
        .route("/tournaments/{code}/start", post(start_tournament))
        .route("/tournaments/{code}/close", post(close_tournament))
        .route(
            "/tournaments/{code}/players",
            get(list_players).post(register_player),
        )
        .route("/tournaments/{code}/players/{id}", put(update_player))
        .route("/tournaments/{code}/players/{id}/dnf", put(set_dnf))
        .route(
            "/tournaments/{code}/scores",
            get(list_scores).post(submit_score),
        )
        .route("/tournaments/{code}/leaderboard", get(leaderboard))
}

/// List every room, newest first.
#[utoipa::path(
    get,
    path = "/tournaments",
    tag = "tournaments",
    responses((status = 200, description = "Known tournaments", body = [TournamentSummary]))
)]
pub async fn list_tournaments(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TournamentSummary>>, AppError> {
    Ok(Json(tournament_service::list_tournaments(&state).await?))
}

/// Open a new room.
#[utoipa::path(
    post,
    path = "/tournaments",
    tag = "tournaments",
    request_body = CreateTournamentRequest,
    responses(
        (status = 201, description = "Tournament created", body = TournamentDetails),
        (status = 400, description = "Invalid name, PIN or code"),
        (status = 409, description = "Room code already in use")
    )
)]
pub async fn create_tournament(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTournamentRequest>>,
) -> Result<(StatusCode, Json<TournamentDetails>), AppError> {
    let created = tournament_service::create_tournament(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/tournaments/{code}",
    tag = "tournaments",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Tournament", body = TournamentDetails),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn get_tournament(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<TournamentDetails>, AppError> {
    Ok(Json(tournament_service::get_tournament(&state, &code).await?))
}

#[utoipa::path(
    put,
    path = "/tournaments/{code}",
    tag = "tournaments",
    params(
        ("X-Director-Pin" = String, Header, description = "Director PIN of the room"),
        ("code" = String, Path, description = "Room code")
    ),
    request_body = UpdateTournamentRequest,
    responses(
        (status = 200, description = "Tournament renamed", body = TournamentSummary),
        (status = 401, description = "Missing or wrong director PIN")
    )
)]
pub async fn rename_tournament(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<UpdateTournamentRequest>>,
) -> Result<Json<TournamentSummary>, AppError> {
    Ok(Json(
        tournament_service::rename_tournament(&state, &code, director_pin(&headers), payload)
            .await?,
    ))
}

/// Tear a room down with its players and scores.
#[utoipa::path(
    delete,
    path = "/tournaments/{code}",
    tag = "tournaments",
    params(
        ("X-Director-Pin" = String, Header, description = "Director PIN of the room"),
        ("code" = String, Path, description = "Room code")
    ),
    responses(
        (status = 200, description = "Tournament deleted", body = ActionResponse),
        (status = 401, description = "Missing or wrong director PIN")
    )
)]
pub async fn delete_tournament(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        tournament_service::delete_tournament(&state, &code, director_pin(&headers)).await?,
    ))
}

/// Check a director PIN before showing director controls.
#[utoipa::path(
    post,
    path = "/tournaments/{code}/verify",
    tag = "tournaments",
    params(
        ("X-Director-Pin" = String, Header, description = "Director PIN of the room"),
        ("code" = String, Path, description = "Room code")
    ),
    responses(
        (status = 200, description = "PIN accepted", body = ActionResponse),
        (status = 401, description = "Missing or wrong director PIN")
    )
)]
pub async fn verify_pin(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        tournament_service::verify_pin(&state, &code, director_pin(&headers)).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/tournaments/{code}/start",
    tag = "tournaments",
    params(
        ("X-Director-Pin" = String, Header, description = "Director PIN of the room"),
        ("code" = String, Path, description = "Room code")
    ),
    responses(
        (status = 200, description = "Tournament started", body = TournamentSummary),
        (status = 401, description = "Missing or wrong director PIN"),
        (status = 409, description = "Room already started or closed")
    )
)]
pub async fn start_tournament(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TournamentSummary>, AppError> {
    Ok(Json(
        tournament_service::start_tournament(&state, &code, director_pin(&headers)).await?,
    ))
}

/// Close the room and archive results into the player directory.
#[utoipa::path(
    post,
    path = "/tournaments/{code}/close",
    tag = "tournaments",
    params(
        ("X-Director-Pin" = String, Header, description = "Director PIN of the room"),
        ("code" = String, Path, description = "Room code")
    ),
    responses(
        (status = 200, description = "Tournament closed", body = CloseTournamentResponse),
        (status = 401, description = "Missing or wrong director PIN"),
        (status = 409, description = "Room already closed")
    )
)]
pub async fn close_tournament(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CloseTournamentResponse>, AppError> {
    Ok(Json(
        tournament_service::close_tournament(&state, &code, director_pin(&headers)).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/tournaments/{code}/players",
    tag = "players",
    params(("code" = String, Path, description = "Room code")),
    responses((status = 200, description = "Registered players", body = [TournamentPlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<TournamentPlayerSummary>>, AppError> {
    Ok(Json(registration_service::list_players(&state, &code).await?))
}

/// Join a room from any device.
#[utoipa::path(
    post,
    path = "/tournaments/{code}/players",
    tag = "players",
    params(("code" = String, Path, description = "Room code")),
    request_body = RegisterPlayerRequest,
    responses(
        (status = 201, description = "Player registered", body = TournamentPlayerSummary),
        (status = 404, description = "Unknown room or directory player"),
        (status = 409, description = "Room closed")
    )
)]
pub async fn register_player(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<RegisterPlayerRequest>>,
) -> Result<(StatusCode, Json<TournamentPlayerSummary>), AppError> {
    let player = registration_service::register_player(&state, &code, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

#[utoipa::path(
    put,
    path = "/tournaments/{code}/players/{id}",
    tag = "players",
    params(
        ("X-Director-Pin" = String, Header, description = "Director PIN of the room"),
        ("code" = String, Path, description = "Room code"),
        ("id" = i64, Path, description = "Tournament player id")
    ),
    request_body = UpdatePlayerRequest,
    responses(
        (status = 200, description = "Player updated", body = TournamentPlayerSummary),
        (status = 401, description = "Missing or wrong director PIN")
    )
)]
pub async fn update_player(
    State(state): State<SharedState>,
    Path((code, id)): Path<(String, i64)>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<UpdatePlayerRequest>>,
) -> Result<Json<TournamentPlayerSummary>, AppError> {
    Ok(Json(
        registration_service::update_player(&state, &code, director_pin(&headers), id, payload)
            .await?,
    ))
}

/// Flag or unflag a player as did-not-finish.
#[utoipa::path(
    put,
    path = "/tournaments/{code}/players/{id}/dnf",
    tag = "players",
    params(
        ("X-Director-Pin" = String, Header, description = "Director PIN of the room"),
        ("code" = String, Path, description = "Room code"),
        ("id" = i64, Path, description = "Tournament player id")
    ),
    request_body = SetDnfRequest,
    responses(
        (status = 200, description = "Player updated", body = TournamentPlayerSummary),
        (status = 401, description = "Missing or wrong director PIN")
    )
)]
pub async fn set_dnf(
    State(state): State<SharedState>,
    Path((code, id)): Path<(String, i64)>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<SetDnfRequest>>,
) -> Result<Json<TournamentPlayerSummary>, AppError> {
    Ok(Json(
        registration_service::set_did_not_finish(
            &state,
            &code,
            director_pin(&headers),
            id,
            payload,
        )
        .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/tournaments/{code}/scores",
    tag = "scores",
    params(("code" = String, Path, description = "Room code")),
    responses((status = 200, description = "Stored score rows", body = [ScoreSummary]))
)]
pub async fn list_scores(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<ScoreSummary>>, AppError> {
    Ok(Json(score_service::list_scores(&state, &code).await?))
}

/// Submit one hole; a resubmission for the same player and hole replaces it.
#[utoipa::path(
    post,
    path = "/tournaments/{code}/scores",
    tag = "scores",
    params(("code" = String, Path, description = "Room code")),
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score stored", body = ScoreSummary),
        (status = 400, description = "Values out of range"),
        (status = 404, description = "Unknown room or player"),
        (status = 409, description = "Room closed")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<SubmitScoreRequest>>,
) -> Result<Json<ScoreSummary>, AppError> {
    Ok(Json(score_service::submit_score(&state, &code, payload).await?))
}

#[utoipa::path(
    get,
    path = "/tournaments/{code}/leaderboard",
    tag = "scores",
    params(("code" = String, Path, description = "Room code")),
    responses((status = 200, description = "Current standings", body = LeaderboardResponse))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(score_service::leaderboard(&state, &code).await?))
}

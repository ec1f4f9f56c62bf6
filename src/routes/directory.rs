use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        directory::{
            DirectoryExport, HandicapStatsResponse, HistoryEntryInput, HistoryEntrySummary,
            ImportResult, MergePlayersRequest, MergePlayersResponse, UniversalPlayerRequest,
            UniversalPlayerSummary,
        },
        tournament::ActionResponse,
    },
    error::AppError,
    services::directory_service,
    state::SharedState,
};

/// Persistent player directory shared across rooms.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", get(list_players).post(create_player))
        .route("/players/merge", post(merge_players))
        .route("/players/export", get(export_directory))
        .route("/players/import", post(import_directory))
        .route(
            "/players/{id}",
            get(get_player).put(rename_player).delete(delete_player),
        )
        .route(
            "/players/{id}/history",
            get(list_history).post(add_history),
        )
        .route(
            "/players/{id}/history/{entry_id}",
            delete(delete_history),
        )
        .route("/players/{id}/stats", get(player_stats))
}

#[utoipa::path(
    get,
    path = "/players",
    operation_id = "list_directory_players",
    tag = "directory",
    responses((status = 200, description = "Directory players", body = [UniversalPlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<Vec<UniversalPlayerSummary>>, AppError> {
    Ok(Json(directory_service::list_players(&state).await?))
}

#[utoipa::path(
    post,
    path = "/players",
    tag = "directory",
    request_body = UniversalPlayerRequest,
    responses((status = 201, description = "Player created", body = UniversalPlayerSummary))
)]
pub async fn create_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UniversalPlayerRequest>>,
) -> Result<(StatusCode, Json<UniversalPlayerSummary>), AppError> {
    let player = directory_service::create_player(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

#[utoipa::path(
    get,
    path = "/players/{id}",
    tag = "directory",
    params(("id" = i64, Path, description = "Directory player id")),
    responses(
        (status = 200, description = "Player", body = UniversalPlayerSummary),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<UniversalPlayerSummary>, AppError> {
    Ok(Json(directory_service::get_player(&state, id).await?))
}

#[utoipa::path(
    put,
    path = "/players/{id}",
    tag = "directory",
    params(("id" = i64, Path, description = "Directory player id")),
    request_body = UniversalPlayerRequest,
    responses((status = 200, description = "Player renamed", body = UniversalPlayerSummary))
)]
pub async fn rename_player(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Valid(Json(payload)): Valid<Json<UniversalPlayerRequest>>,
) -> Result<Json<UniversalPlayerSummary>, AppError> {
    Ok(Json(
        directory_service::rename_player(&state, id, payload).await?,
    ))
}

/// Delete a player and its history; room registrations lose the link.
#[utoipa::path(
    delete,
    path = "/players/{id}",
    tag = "directory",
    params(("id" = i64, Path, description = "Directory player id")),
    responses((status = 200, description = "Player deleted", body = ActionResponse))
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(directory_service::delete_player(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/players/{id}/history",
    tag = "directory",
    params(("id" = i64, Path, description = "Directory player id")),
    responses((status = 200, description = "History, oldest first", body = [HistoryEntrySummary]))
)]
pub async fn list_history(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<HistoryEntrySummary>>, AppError> {
    Ok(Json(directory_service::list_history(&state, id).await?))
}

/// Record a past result by hand.
#[utoipa::path(
    post,
    path = "/players/{id}/history",
    tag = "directory",
    params(("id" = i64, Path, description = "Directory player id")),
    request_body = HistoryEntryInput,
    responses((status = 201, description = "Entry added", body = HistoryEntrySummary))
)]
pub async fn add_history(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Valid(Json(payload)): Valid<Json<HistoryEntryInput>>,
) -> Result<(StatusCode, Json<HistoryEntrySummary>), AppError> {
    let entry = directory_service::add_history(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/players/{id}/history/{entry_id}",
    tag = "directory",
    params(
        ("id" = i64, Path, description = "Directory player id"),
        ("entry_id" = i64, Path, description = "History entry id")
    ),
    responses((status = 200, description = "Entry deleted", body = ActionResponse))
)]
pub async fn delete_history(
    State(state): State<SharedState>,
    Path((id, entry_id)): Path<(i64, i64)>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        directory_service::delete_history(&state, id, entry_id).await?,
    ))
}

/// Infractions per tournament (PPT) and per hole (PPC).
#[utoipa::path(
    get,
    path = "/players/{id}/stats",
    tag = "directory",
    params(("id" = i64, Path, description = "Directory player id")),
    responses((status = 200, description = "Handicap statistics", body = HandicapStatsResponse))
)]
pub async fn player_stats(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<HandicapStatsResponse>, AppError> {
    Ok(Json(directory_service::player_stats(&state, id).await?))
}

/// Fold a duplicate player into another one.
#[utoipa::path(
    post,
    path = "/players/merge",
    tag = "directory",
    request_body = MergePlayersRequest,
    responses(
        (status = 200, description = "Players merged", body = MergePlayersResponse),
        (status = 400, description = "Source and target are the same player")
    )
)]
pub async fn merge_players(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<MergePlayersRequest>>,
) -> Result<Json<MergePlayersResponse>, AppError> {
    Ok(Json(directory_service::merge_players(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/players/export",
    tag = "directory",
    responses((status = 200, description = "Directory document", body = DirectoryExport))
)]
pub async fn export_directory(
    State(state): State<SharedState>,
) -> Result<Json<DirectoryExport>, AppError> {
    Ok(Json(directory_service::export_directory(&state).await?))
}

#[utoipa::path(
    post,
    path = "/players/import",
    tag = "directory",
    request_body = DirectoryExport,
    responses((status = 200, description = "Import summary", body = ImportResult))
)]
pub async fn import_directory(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<DirectoryExport>>,
) -> Result<Json<ImportResult>, AppError> {
    Ok(Json(
        directory_service::import_directory(&state, payload).await?,
    ))
}

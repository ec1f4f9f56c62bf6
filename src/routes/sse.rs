use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/tournaments/{code}/events",
    tag = "sse",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Room event stream; starts with a leaderboard snapshot", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown room")
    )
)]
/// Stream live room changes: scores, leaderboard, players and status.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (snapshot, receiver) = sse_service::subscribe_room(&state, &code).await?;
    let code = code.to_uppercase();
    info!(code = %code, "new room SSE connection");
    Ok(sse_service::to_sse_stream(code, snapshot, receiver))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/tournaments/{code}/events", get(room_stream))
}

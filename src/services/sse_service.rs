use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{leaderboard::compute_leaderboard, sse_events, tournament_service},
    state::SharedState,
};

/// Subscribe to a room and build the leaderboard snapshot sent first on the stream.
///
/// The subscription is taken before the snapshot is read so no change made in
/// between can be missed.
pub async fn subscribe_room(
    state: &SharedState,
    code: &str,
) -> Result<(ServerEvent, broadcast::Receiver<ServerEvent>), ServiceError> {
    let (store, tournament) = tournament_service::load_room(state, code).await?;
    let receiver = state.rooms().subscribe(&tournament.code);

    let players = store.list_tournament_players(tournament.id).await?;
    let scores = store.list_scores(tournament.id).await?;
    let entries = compute_leaderboard(&players, &scores);
    let snapshot = ServerEvent::json(
        Some(sse_events::EVENT_LEADERBOARD.to_string()),
        &sse_events::leaderboard_event(&tournament.code, entries),
    )
    .map_err(|err| ServiceError::InvalidState(format!("failed to encode snapshot: {err}")))?;

    Ok((snapshot, receiver))
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    code: String,
    initial: ServerEvent,
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if tx.send(Ok(to_event(initial))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            tracing::debug!(code = %code, skipped, "room SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(code = %code, "room SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

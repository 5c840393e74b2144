use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        scoring::ScoreboardSnapshot,
        sse::{Handshake, ServerEvent},
    },
    services::sse_events::EVENT_HANDSHAKE,
    state::SharedState,
};

/// Subscribe to the scoreboard stream of `game_id`.
///
/// The returned handshake describes the stream and carries the current
/// scoreboard when a session is open.
pub async fn subscribe_game(
    state: &SharedState,
    game_id: Uuid,
) -> (broadcast::Receiver<ServerEvent>, Option<ServerEvent>) {
    let receiver = state.game_hub(game_id).subscribe();

    let scoreboard = match state.session(game_id) {
        Some(session) => Some(ScoreboardSnapshot::new(game_id, &session.snapshot().await)),
        None => None,
    };
    let handshake = Handshake {
        game_id,
        message: "scoreboard stream connected".into(),
        degraded: state.is_degraded().await,
        scoreboard,
    };

    let event = ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake)
        .map_err(|err| warn!(%game_id, error = %err, "failed to serialize SSE handshake"))
        .ok();
    (receiver, event)
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    state: SharedState,
    game_id: Uuid,
    mut receiver: broadcast::Receiver<ServerEvent>,
    handshake: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(event) = handshake {
            if tx.send(Ok(to_event(event))).await.is_err() {
                drop(receiver);
                state.release_game_hub(game_id);
                return;
            }
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
                            // Later events carry the full scoreboard.
                            debug!(%game_id, skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        drop(receiver);
        state.release_game_hub(game_id);
        info!(%game_id, "scoreboard SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

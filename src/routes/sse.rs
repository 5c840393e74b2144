use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/games/{id}",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the game to follow")),
    responses((status = 200, description = "Live scoreboard stream", content_type = "text/event-stream", body = String))
)]
/// Stream live scoreboard events for one game.
///
/// A `handshake` event is sent first, followed by `score.*` and `session.*`
/// events as the operator scores.
pub async fn game_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (receiver, handshake) = sse_service::subscribe_game(&state, id).await;
    info!(game_id = %id, "new scoreboard SSE connection");
    sse_service::to_sse_stream(state, id, receiver, handshake)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/games/{id}", get(game_stream))
}

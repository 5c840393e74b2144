use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        scoring::ScoreboardSnapshot,
        sse::{
            ReadyToAdvanceEvent, ScoreRolledBackEvent, ScoreUpdatedEvent, ServerEvent,
            SessionClosedEvent, SessionOpenedEvent,
        },
    },
    scoring::{game::GameState, lifecycle::ActionKind, session::MutationOutcome},
    state::SharedState,
};

/// An action was applied locally and is being persisted.
pub const EVENT_SCORE_UPDATED: &str = "score.updated";
/// A persisted action failed and was reverted.
pub const EVENT_SCORE_ROLLED_BACK: &str = "score.rolled_back";
/// Three outs were confirmed.
pub const EVENT_READY_TO_ADVANCE: &str = "score.ready_to_advance";
/// A scoring session was opened.
pub const EVENT_SESSION_OPENED: &str = "session.opened";
/// The scoring session was closed.
pub const EVENT_SESSION_CLOSED: &str = "session.closed";
/// First event of every stream.
pub const EVENT_HANDSHAKE: &str = "handshake";

/// Broadcast an optimistically applied action.
pub fn broadcast_score_updated(state: &SharedState, game_id: Uuid, outcome: &MutationOutcome) {
    let payload = ScoreUpdatedEvent {
        action: outcome.kind,
        scoreboard: ScoreboardSnapshot::new(game_id, &outcome.state),
        can_undo: outcome.can_undo,
    };
    send_game_event(state, game_id, EVENT_SCORE_UPDATED, &payload);
}

/// Broadcast that an action was reverted after the store refused it.
pub fn broadcast_score_rolled_back(
    state: &SharedState,
    game_id: Uuid,
    action: ActionKind,
    reason: &str,
    game: &GameState,
) {
    let payload = ScoreRolledBackEvent {
        action,
        reason: reason.to_string(),
        scoreboard: ScoreboardSnapshot::new(game_id, game),
    };
    send_game_event(state, game_id, EVENT_SCORE_ROLLED_BACK, &payload);
}

/// Prompt the operator to advance once three outs are confirmed.
pub fn broadcast_ready_to_advance(state: &SharedState, game_id: Uuid, game: &GameState) {
    let payload = ReadyToAdvanceEvent {
        game_id,
        inning: game.current_inning,
        half: game.current_inning_half,
    };
    send_game_event(state, game_id, EVENT_READY_TO_ADVANCE, &payload);
}

/// Announce a newly opened scoring session.
pub fn broadcast_session_opened(state: &SharedState, game_id: Uuid, game: &GameState) {
    let payload = SessionOpenedEvent {
        scoreboard: ScoreboardSnapshot::new(game_id, game),
    };
    send_game_event(state, game_id, EVENT_SESSION_OPENED, &payload);
}

/// Announce that the scoring session was closed.
pub fn broadcast_session_closed(state: &SharedState, game_id: Uuid) {
    send_game_event(
        state,
        game_id,
        EVENT_SESSION_CLOSED,
        &SessionClosedEvent { game_id },
    );
}

fn send_game_event(state: &SharedState, game_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.game_hub(game_id).broadcast(event),
        Err(err) => warn!(event, %game_id, error = %err, "failed to serialize game SSE payload"),
    }
}

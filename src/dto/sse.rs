use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::scoring::ScoreboardSnapshot,
    scoring::{game::InningHalf, lifecycle::ActionKind},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Event carrying a preformatted data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub game_id: Uuid,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Current scoreboard when a session is open for the game.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoreboard: Option<ScoreboardSnapshot>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast as soon as an action is applied, before the store confirms it.
pub struct ScoreUpdatedEvent {
    pub action: ActionKind,
    pub scoreboard: ScoreboardSnapshot,
    pub can_undo: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the store refused an action and the scoreboard went back.
pub struct ScoreRolledBackEvent {
    pub action: ActionKind,
    pub reason: String,
    pub scoreboard: ScoreboardSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when three outs are recorded in the current half.
pub struct ReadyToAdvanceEvent {
    pub game_id: Uuid,
    pub inning: u32,
    pub half: InningHalf,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a scoring session is opened for a game.
pub struct SessionOpenedEvent {
    pub scoreboard: ScoreboardSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the scoring session of a game is closed.
pub struct SessionClosedEvent {
    pub game_id: Uuid,
}

//! DTO definitions used by the scoring REST API and the live scoreboard stream.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::format_system_time,
    scoring::{
        game::{GameState, GameStatus, InningHalf},
        history::ActionHistoryEntry,
        lifecycle::ActionKind,
        session::MutationOutcome,
    },
};

/// Scoreboard of one game as shown to operators and spectators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScoreboardSnapshot {
    pub game_id: Uuid,
    pub status: GameStatus,
    pub home_score: u32,
    pub away_score: u32,
    pub current_inning: u32,
    pub current_inning_half: InningHalf,
    pub outs: u8,
    pub home_inning_scores: Vec<u32>,
    pub away_inning_scores: Vec<u32>,
    /// RFC 3339 start time, absent before the first start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// RFC 3339 end time, absent until the game is final.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

impl ScoreboardSnapshot {
    /// Project `game` for the wire.
    pub fn new(game_id: Uuid, game: &GameState) -> Self {
        Self {
            game_id,
            status: game.status,
            home_score: game.home_score,
            away_score: game.away_score,
            current_inning: game.current_inning,
            current_inning_half: game.current_inning_half,
            outs: game.outs,
            home_inning_scores: game.home_inning_scores.clone(),
            away_inning_scores: game.away_inning_scores.clone(),
            started_at: game.started_at.map(format_system_time),
            ended_at: game.ended_at.map(format_system_time),
        }
    }
}

/// State of an open scoring session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub scoreboard: ScoreboardSnapshot,
    /// Whether `/undo` would revert something.
    pub can_undo: bool,
    /// A mutation is waiting for the store's confirmation.
    pub busy: bool,
}

/// One undoable action, most recent first in listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryView {
    pub id: Uuid,
    pub kind: ActionKind,
    pub description: String,
    pub timestamp: String,
}

impl From<&ActionHistoryEntry> for HistoryEntryView {
    fn from(entry: &ActionHistoryEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            description: entry.description.clone(),
            timestamp: format_system_time(entry.timestamp),
        }
    }
}

/// Request to credit runs to the batting team of the current inning.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RecordRunsRequest {
    #[validate(range(min = 0))]
    pub runs: i32,
    /// Half whose batting team scored; defaults to the current half.
    #[serde(default)]
    pub half: Option<InningHalf>,
}

/// Request to set the out count of the current half-inning.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChangeOutsRequest {
    #[validate(range(min = 0, max = 3))]
    pub outs: i32,
}

/// Result of a confirmed scoring action.
#[derive(Debug, Serialize, ToSchema)]
pub struct MutationResponse {
    pub action: ActionKind,
    /// False only for an undo with nothing to revert.
    pub applied: bool,
    pub scoreboard: ScoreboardSnapshot,
    /// Three outs are recorded; the operator should advance the inning.
    pub ready_to_advance: bool,
    pub can_undo: bool,
}

impl MutationResponse {
    /// Response for an action the store confirmed.
    pub fn confirmed(game_id: Uuid, outcome: &MutationOutcome) -> Self {
        Self {
            action: outcome.kind,
            applied: true,
            scoreboard: ScoreboardSnapshot::new(game_id, &outcome.state),
            ready_to_advance: outcome.ready_to_advance,
            can_undo: outcome.can_undo,
        }
    }

    /// Response for an undo that found an empty log.
    pub fn nothing_to_undo(game_id: Uuid, game: &GameState) -> Self {
        Self {
            action: ActionKind::Undo,
            applied: false,
            scoreboard: ScoreboardSnapshot::new(game_id, game),
            ready_to_advance: false,
            can_undo: false,
        }
    }
}

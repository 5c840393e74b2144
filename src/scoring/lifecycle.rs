use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::scoring::game::{GameState, GameStatus, InningHalf};

/// Operations an operator can perform against a scoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Credit runs to the batting team.
    RecordRuns,
    /// Change the out count.
    ChangeOuts,
    /// Move to the next half-inning.
    AdvanceInning,
    /// Begin (or resume) play.
    StartGame,
    /// Halt play before completion.
    SuspendGame,
    /// Close the game.
    EndGame,
    /// Revert the most recent action.
    Undo,
}

impl ActionKind {
    /// Whether this action edits the scoreboard rather than the lifecycle.
    pub fn is_scoring(self) -> bool {
        matches!(
            self,
            ActionKind::RecordRuns | ActionKind::ChangeOuts | ActionKind::AdvanceInning
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::RecordRuns => "record_runs",
            ActionKind::ChangeOuts => "change_outs",
            ActionKind::AdvanceInning => "advance_inning",
            ActionKind::StartGame => "start_game",
            ActionKind::SuspendGame => "suspend_game",
            ActionKind::EndGame => "end_game",
            ActionKind::Undo => "undo",
        };
        f.write_str(label)
    }
}

/// Error returned when the current status forbids an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {action} cannot be applied while the game is {from:?}")]
pub struct InvalidTransition {
    /// Status the game was in when the action was received.
    pub from: GameStatus,
    /// The rejected action.
    pub action: ActionKind,
}

/// Status the game ends up in after `action`, if `action` is allowed.
pub fn next_status(from: GameStatus, action: ActionKind) -> Result<GameStatus, InvalidTransition> {
    let next = match (from, action) {
        (GameStatus::Scheduled | GameStatus::Warmup, ActionKind::StartGame) => {
            GameStatus::InProgress
        }
        (GameStatus::Suspended, ActionKind::StartGame) => GameStatus::InProgress,
        (GameStatus::InProgress, ActionKind::SuspendGame) => GameStatus::Suspended,
        (GameStatus::InProgress | GameStatus::Suspended, ActionKind::EndGame) => GameStatus::Final,
        (GameStatus::InProgress, kind) if kind.is_scoring() => GameStatus::InProgress,
        // Undo restores whatever status the reverted action recorded.
        (status, ActionKind::Undo) if status != GameStatus::Final => status,
        (from, action) => return Err(InvalidTransition { from, action }),
    };

    Ok(next)
}

/// Reject scoring operations unless the game is live.
pub fn ensure_scoring_allowed(
    status: GameStatus,
    action: ActionKind,
) -> Result<(), InvalidTransition> {
    if action.is_scoring() {
        next_status(status, action).map(|_| ())
    } else {
        Err(InvalidTransition {
            from: status,
            action,
        })
    }
}

/// Apply a lifecycle action (`StartGame`, `SuspendGame`, `EndGame`) to `state`.
///
/// A first start resets the inning position to the top of the first with no
/// outs and stamps the start time. Resuming a suspended game keeps the line
/// score and position untouched.
pub fn apply_lifecycle(
    state: &GameState,
    action: ActionKind,
    now: SystemTime,
) -> Result<GameState, InvalidTransition> {
    if !matches!(
        action,
        ActionKind::StartGame | ActionKind::SuspendGame | ActionKind::EndGame
    ) {
        return Err(InvalidTransition {
            from: state.status,
            action,
        });
    }

    let status = next_status(state.status, action)?;
    let mut next = state.clone();

    match (state.status, action) {
        (GameStatus::Scheduled | GameStatus::Warmup, ActionKind::StartGame) => {
            next.current_inning = 1;
            next.current_inning_half = InningHalf::Top;
            next.outs = 0;
            next.started_at = Some(now);
        }
        (GameStatus::Suspended, ActionKind::StartGame) => {
            next.started_at = state.started_at.or(Some(now));
        }
        (_, ActionKind::EndGame) => next.ended_at = Some(now),
        _ => {}
    }

    next.status = status;
    Ok(next)
}

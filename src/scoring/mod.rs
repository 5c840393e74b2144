//! Live scoring core: pure scoreboard transitions and the per-game session
//! coordinating optimistic updates with the persistence collaborator.

/// Scoreboard state and partial updates.
pub mod game;
/// Bounded undo log.
pub mod history;
pub mod innings;
/// Game status transitions.
pub mod lifecycle;
pub mod runs;
pub mod session;

use thiserror::Error;
use uuid::Uuid;

pub use self::lifecycle::InvalidTransition;

/// Failures surfaced by scoring operations. None of them leave the session in
/// a partially applied state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The game status forbids the operation; nothing was applied.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The store rejected or timed out on the update; the local state was
    /// rolled back and the operation may be retried.
    #[error("failed to persist game update: {reason}")]
    PersistenceFailure {
        /// Description of the underlying storage failure.
        reason: String,
    },
    /// A numeric argument was outside its documented bounds; nothing was
    /// applied.
    #[error("{field} value {value} is out of range")]
    OutOfRangeValue {
        /// Name of the offending argument.
        field: &'static str,
        /// Value that was supplied.
        value: i64,
    },
    /// The store has no row for the game.
    #[error("game `{0}` not found")]
    MissingGame(Uuid),
}

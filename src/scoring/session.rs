//! Per-game scoring session.
//!
//! Every mutation is applied in two phases: [`ScoringSession::begin`] applies
//! it to the local copy and records it in the undo log while holding the
//! session's in-flight guard; [`ScoringSession::settle`] then either keeps it
//! (store confirmed) or rolls it back (store failed or timed out). Readers
//! observe the optimistic state through [`ScoringSession::snapshot`] as soon
//! as `begin` returns.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::game_store::GameStore,
    scoring::{
        InvalidTransition, ScoringError,
        game::{GameState, GameStatePatch, InningHalf, PatchField, Side},
        history::{ActionHistory, ActionHistoryEntry, EntryId},
        innings::{advance_half_inning, set_outs},
        lifecycle::{ActionKind, apply_lifecycle, ensure_scoring_allowed, next_status},
        runs::apply_runs,
    },
};

/// Operator commands accepted by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringCommand {
    /// Credit `runs` to the team batting in `half` for the current inning.
    RecordRuns {
        /// Runs scored, must be non-negative.
        runs: i32,
        /// Half whose batting team scored.
        half: InningHalf,
    },
    /// Set the out count to `outs` (0 to 3).
    ChangeOuts {
        /// Target out count.
        outs: i32,
    },
    /// Move to the next half-inning.
    AdvanceInning,
    /// Start or resume the game.
    StartGame,
    /// Suspend the game.
    SuspendGame,
    /// End the game.
    EndGame,
    /// Revert the most recent recorded action.
    Undo,
}

impl ScoringCommand {
    /// Kind recorded for this command.
    pub fn kind(&self) -> ActionKind {
        match self {
            ScoringCommand::RecordRuns { .. } => ActionKind::RecordRuns,
            ScoringCommand::ChangeOuts { .. } => ActionKind::ChangeOuts,
            ScoringCommand::AdvanceInning => ActionKind::AdvanceInning,
            ScoringCommand::StartGame => ActionKind::StartGame,
            ScoringCommand::SuspendGame => ActionKind::SuspendGame,
            ScoringCommand::EndGame => ActionKind::EndGame,
            ScoringCommand::Undo => ActionKind::Undo,
        }
    }
}

/// What the caller sees once a mutation has been applied (and, after
/// [`ScoringSession::settle`], confirmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Kind of the applied command.
    pub kind: ActionKind,
    /// Local state after the command.
    pub state: GameState,
    /// Three outs were just recorded; prompt the operator to advance.
    pub ready_to_advance: bool,
    /// Whether the undo log holds at least one entry.
    pub can_undo: bool,
}

enum Bookkeeping {
    Recorded {
        id: EntryId,
        evicted: Option<ActionHistoryEntry>,
    },
    Undone(ActionHistoryEntry),
}

/// A locally applied mutation waiting for the store's verdict.
///
/// Holds the session's in-flight guard: no other mutation can begin until
/// this value is passed to [`ScoringSession::settle`] or dropped.
pub struct PendingMutation {
    _guard: OwnedMutexGuard<()>,
    delta: GameStatePatch,
    rollback: GameStatePatch,
    bookkeeping: Bookkeeping,
    outcome: MutationOutcome,
}

impl PendingMutation {
    /// Optimistic outcome, valid until the mutation settles.
    pub fn outcome(&self) -> &MutationOutcome {
        &self.outcome
    }

    /// Fields sent to the store.
    pub fn delta(&self) -> &GameStatePatch {
        &self.delta
    }
}

struct LocalState {
    game: GameState,
    history: ActionHistory,
}

/// Sole owner of the working copy of one game while it is being scored.
pub struct ScoringSession {
    game_id: Uuid,
    store: Arc<dyn GameStore>,
    persist_timeout: Option<Duration>,
    local: RwLock<LocalState>,
    in_flight: Arc<Mutex<()>>,
}

impl ScoringSession {
    /// Build a session around an already loaded row.
    pub fn new(
        game_id: Uuid,
        game: GameState,
        store: Arc<dyn GameStore>,
        persist_timeout: Option<Duration>,
    ) -> Self {
        Self {
            game_id,
            store,
            persist_timeout,
            local: RwLock::new(LocalState {
                game,
                history: ActionHistory::new(),
            }),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Load the row for `game_id` from `store` and open a session on it.
    pub async fn open(
        game_id: Uuid,
        store: Arc<dyn GameStore>,
        persist_timeout: Option<Duration>,
    ) -> Result<Self, ScoringError> {
        let game = load(&store, game_id, persist_timeout).await?;
        info!(%game_id, status = ?game.status, "scoring session opened");
        Ok(Self::new(game_id, game, store, persist_timeout))
    }

    /// Identifier of the scored game.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Current local state, including any optimistic change still in flight.
    pub async fn snapshot(&self) -> GameState {
        self.local.read().await.game.clone()
    }

    /// Undo log entries, most recent first.
    pub async fn history(&self) -> Vec<ActionHistoryEntry> {
        self.local.read().await.history.iter_recent().cloned().collect()
    }

    /// Whether undo would revert something.
    pub async fn can_undo(&self) -> bool {
        !self.local.read().await.history.is_empty()
    }

    /// Whether a mutation is currently waiting on the store.
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Credit runs to the team batting in `half`.
    pub async fn record_runs(
        &self,
        runs: i32,
        half: InningHalf,
    ) -> Result<MutationOutcome, ScoringError> {
        self.run_forward(ScoringCommand::RecordRuns { runs, half })
            .await
    }

    /// Set the out count. `ready_to_advance` is set when it reaches three;
    /// the inning is never advanced here.
    pub async fn change_outs(&self, outs: i32) -> Result<MutationOutcome, ScoringError> {
        self.run_forward(ScoringCommand::ChangeOuts { outs }).await
    }

    /// Move to the next half-inning and clear the outs.
    pub async fn advance_inning(&self) -> Result<MutationOutcome, ScoringError> {
        self.run_forward(ScoringCommand::AdvanceInning).await
    }

    /// Start (or resume) the game.
    pub async fn start_game(&self) -> Result<MutationOutcome, ScoringError> {
        self.run_forward(ScoringCommand::StartGame).await
    }

    /// Suspend the game.
    pub async fn suspend_game(&self) -> Result<MutationOutcome, ScoringError> {
        self.run_forward(ScoringCommand::SuspendGame).await
    }

    /// End the game.
    pub async fn end_game(&self) -> Result<MutationOutcome, ScoringError> {
        self.run_forward(ScoringCommand::EndGame).await
    }

    /// Revert the most recent action and persist the reverted fields.
    ///
    /// Returns `Ok(None)` when the log is empty.
    pub async fn undo_last_action(&self) -> Result<Option<MutationOutcome>, ScoringError> {
        match self.begin(ScoringCommand::Undo).await? {
            Some(pending) => self.complete(pending).await.map(Some),
            None => Ok(None),
        }
    }

    /// Replace the local copy with the store's row and forget the undo log.
    ///
    /// Waits for any in-flight mutation to settle first.
    pub async fn refresh(&self) -> Result<GameState, ScoringError> {
        let _guard = self.in_flight.lock().await;
        let game = load(&self.store, self.game_id, self.persist_timeout).await?;

        let mut local = self.local.write().await;
        local.game = game.clone();
        local.history.clear();
        info!(game_id = %self.game_id, "scoring session refreshed from store");
        Ok(game)
    }

    /// Validate `command` and apply it locally.
    ///
    /// Waits for the previous mutation to settle. Returns `Ok(None)` only for
    /// [`ScoringCommand::Undo`] on an empty log.
    pub async fn begin(
        &self,
        command: ScoringCommand,
    ) -> Result<Option<PendingMutation>, ScoringError> {
        let guard = self.in_flight.clone().lock_owned().await;
        let mut local = self.local.write().await;
        let kind = command.kind();
        next_status(local.game.status, kind)?;

        if command == ScoringCommand::Undo {
            let Some(entry) = local.history.undo_last() else {
                debug!(game_id = %self.game_id, "undo requested with empty history");
                return Ok(None);
            };

            let rollback = GameStatePatch::select(&local.game, &entry.prior.fields());
            local.game.apply_patch(&entry.prior);
            debug!(
                game_id = %self.game_id,
                undone = ?entry.kind,
                description = %entry.description,
                "undo applied locally"
            );

            let outcome = MutationOutcome {
                kind,
                state: local.game.clone(),
                ready_to_advance: false,
                can_undo: !local.history.is_empty(),
            };
            return Ok(Some(PendingMutation {
                _guard: guard,
                delta: entry.prior.clone(),
                rollback,
                bookkeeping: Bookkeeping::Undone(entry),
                outcome,
            }));
        }

        let step = compute(&local.game, command)?;
        let rollback = GameStatePatch::select(&local.game, &step.fields);
        let delta = GameStatePatch::select(&step.next, &step.fields);

        local.game = step.next;
        let (entry_id, evicted) = local
            .history
            .record(kind, step.description.clone(), rollback.clone());
        debug!(
            game_id = %self.game_id,
            kind = ?kind,
            description = %step.description,
            "mutation applied locally"
        );

        let outcome = MutationOutcome {
            kind,
            state: local.game.clone(),
            ready_to_advance: step.ready_to_advance,
            can_undo: true,
        };
        Ok(Some(PendingMutation {
            _guard: guard,
            delta,
            rollback,
            bookkeeping: Bookkeeping::Recorded {
                id: entry_id,
                evicted,
            },
            outcome,
        }))
    }

    /// Send the pending delta to the store, bounded by the persist timeout.
    pub async fn persist(&self, pending: &PendingMutation) -> Result<GameState, ScoringError> {
        let call = self
            .store
            .persist_game_update(self.game_id, pending.delta.clone());

        let result = match self.persist_timeout {
            Some(limit) => match timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ScoringError::PersistenceFailure {
                        reason: format!("store did not answer within {limit:?}"),
                    });
                }
            },
            None => call.await,
        };

        result.map_err(|err| ScoringError::PersistenceFailure {
            reason: err.to_string(),
        })
    }

    /// Keep or roll back `pending` depending on the store's answer, then
    /// release the in-flight guard.
    pub async fn settle(
        &self,
        pending: PendingMutation,
        persisted: Result<GameState, ScoringError>,
    ) -> Result<MutationOutcome, ScoringError> {
        let PendingMutation {
            _guard,
            rollback,
            bookkeeping,
            outcome,
            ..
        } = pending;

        match persisted {
            Ok(stored) => {
                if stored != outcome.state {
                    debug!(
                        game_id = %self.game_id,
                        "store row differs from local copy; keeping local copy"
                    );
                }
                Ok(outcome)
            }
            Err(err) => {
                let mut local = self.local.write().await;
                local.game.apply_patch(&rollback);
                match bookkeeping {
                    Bookkeeping::Recorded { id, evicted } => {
                        local.history.discard(id);
                        if let Some(entry) = evicted {
                            local.history.reinstate_oldest(entry);
                        }
                    }
                    Bookkeeping::Undone(entry) => local.history.restore(entry),
                }
                warn!(
                    game_id = %self.game_id,
                    kind = ?outcome.kind,
                    error = %err,
                    "persisting game update failed; local change rolled back"
                );
                Err(err)
            }
        }
    }

    async fn run_forward(&self, command: ScoringCommand) -> Result<MutationOutcome, ScoringError> {
        match self.begin(command).await? {
            Some(pending) => self.complete(pending).await,
            // Only undo can come back empty.
            None => Ok(MutationOutcome {
                kind: command.kind(),
                state: self.snapshot().await,
                ready_to_advance: false,
                can_undo: self.can_undo().await,
            }),
        }
    }

    async fn complete(&self, pending: PendingMutation) -> Result<MutationOutcome, ScoringError> {
        let persisted = self.persist(&pending).await;
        self.settle(pending, persisted).await
    }
}

struct Step {
    next: GameState,
    fields: Vec<PatchField>,
    description: String,
    ready_to_advance: bool,
}

fn compute(game: &GameState, command: ScoringCommand) -> Result<Step, ScoringError> {
    let kind = command.kind();
    let step = match command {
        ScoringCommand::RecordRuns { runs, half } => {
            ensure_scoring_allowed(game.status, kind)?;
            let next = apply_runs(game, runs, half)?;
            let side = half.batting_team();
            let fields = match side {
                Side::Home => {
                    vec![PatchField::HomeScore, PatchField::HomeInningScores]
                }
                Side::Away => {
                    vec![PatchField::AwayScore, PatchField::AwayInningScores]
                }
            };
            let noun = if runs == 1 { "run" } else { "runs" };
            Step {
                next,
                fields,
                description: format!(
                    "{runs} {noun} for {side} ({half} {})",
                    game.current_inning
                ),
                ready_to_advance: false,
            }
        }
        ScoringCommand::ChangeOuts { outs } => {
            ensure_scoring_allowed(game.status, kind)?;
            let change = set_outs(game.outs, outs)?;
            let mut next = game.clone();
            next.outs = change.outs;
            Step {
                next,
                fields: vec![PatchField::Outs],
                description: format!("outs {} -> {}", game.outs, change.outs),
                ready_to_advance: change.ready_to_advance,
            }
        }
        ScoringCommand::AdvanceInning => {
            ensure_scoring_allowed(game.status, kind)?;
            let advance = advance_half_inning(game.current_inning, game.current_inning_half);
            let mut next = game.clone();
            next.current_inning = advance.inning;
            next.current_inning_half = advance.half;
            next.outs = advance.outs;
            Step {
                next,
                fields: vec![
                    PatchField::CurrentInning,
                    PatchField::CurrentInningHalf,
                    PatchField::Outs,
                ],
                description: format!("advance to {} {}", advance.half, advance.inning),
                ready_to_advance: false,
            }
        }
        ScoringCommand::StartGame => {
            let next = apply_lifecycle(game, kind, SystemTime::now())?;
            Step {
                next,
                fields: vec![
                    PatchField::Status,
                    PatchField::CurrentInning,
                    PatchField::CurrentInningHalf,
                    PatchField::Outs,
                    PatchField::StartedAt,
                ],
                description: if game.started_at.is_some() {
                    "game resumed".into()
                } else {
                    "game started".into()
                },
                ready_to_advance: false,
            }
        }
        ScoringCommand::SuspendGame => Step {
            next: apply_lifecycle(game, kind, SystemTime::now())?,
            fields: vec![PatchField::Status],
            description: "game suspended".into(),
            ready_to_advance: false,
        },
        ScoringCommand::EndGame => Step {
            next: apply_lifecycle(game, kind, SystemTime::now())?,
            fields: vec![PatchField::Status, PatchField::EndedAt],
            description: "game ended".into(),
            ready_to_advance: false,
        },
        ScoringCommand::Undo => {
            return Err(InvalidTransition {
                from: game.status,
                action: kind,
            }
            .into());
        }
    };

    Ok(step)
}

async fn load(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
    limit: Option<Duration>,
) -> Result<GameState, ScoringError> {
    let call = store.load_game(game_id);
    let result = match limit {
        Some(limit) => timeout(limit, call)
            .await
            .map_err(|_| ScoringError::PersistenceFailure {
                reason: format!("store did not answer within {limit:?}"),
            })?,
        None => call.await,
    };

    let game = result
        .map_err(|err| ScoringError::PersistenceFailure {
            reason: err.to_string(),
        })?
        .ok_or(ScoringError::MissingGame(game_id))?;
    check_row(&game)?;
    Ok(game)
}

/// Reject a stored row whose counters break the scoreboard invariants.
fn check_row(game: &GameState) -> Result<(), ScoringError> {
    if game.outs > 3 {
        return Err(ScoringError::OutOfRangeValue {
            field: "outs",
            value: i64::from(game.outs),
        });
    }
    if game.current_inning == 0 {
        return Err(ScoringError::OutOfRangeValue {
            field: "current_inning",
            value: 0,
        });
    }
    for side in [Side::Home, Side::Away] {
        let cells: u64 = game.inning_scores(side).iter().copied().map(u64::from).sum();
        if cells != u64::from(game.score(side)) {
            return Err(ScoringError::OutOfRangeValue {
                field: match side {
                    Side::Home => "home_score",
                    Side::Away => "away_score",
                },
                value: i64::from(game.score(side)),
            });
        }
    }
    Ok(())
}

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::scoring::{
        ChangeOutsRequest, HistoryEntryView, MutationResponse, RecordRunsRequest,
        ScoreboardSnapshot, SessionView,
    },
    error::ServiceError,
    scoring::{
        ScoringError,
        session::{ScoringCommand, ScoringSession},
    },
    services::sse_events,
    state::SharedState,
};

/// Open a scoring session for `game_id`, reusing the existing one if any.
pub async fn open_session(state: &SharedState, game_id: Uuid) -> Result<SessionView, ServiceError> {
    if let Some(session) = state.session(game_id) {
        return Ok(session_view(&session).await);
    }

    let store = state.require_game_store().await?;
    let opened = ScoringSession::open(game_id, store, state.config().persist_timeout()).await?;

    let (session, created) = match state.sessions().entry(game_id) {
        // Another request opened it while we were loading.
        Entry::Occupied(existing) => (existing.get().clone(), false),
        Entry::Vacant(slot) => (slot.insert(Arc::new(opened)).value().clone(), true),
    };

    if created {
        let game = session.snapshot().await;
        sse_events::broadcast_session_opened(state, game_id, &game);
    }
    Ok(session_view(&session).await)
}

/// Current view of the session of `game_id`.
pub async fn get_session(state: &SharedState, game_id: Uuid) -> Result<SessionView, ServiceError> {
    let session = require_session(state, game_id)?;
    Ok(session_view(&session).await)
}

/// Discard the session of `game_id`. A mutation still in flight settles on
/// its own.
pub fn close_session(state: &SharedState, game_id: Uuid) -> Result<(), ServiceError> {
    if state.sessions().remove(&game_id).is_none() {
        return Err(not_open(game_id));
    }

    info!(%game_id, "scoring session closed");
    sse_events::broadcast_session_closed(state, game_id);
    state.release_game_hub(game_id);
    Ok(())
}

/// Reload the session of `game_id` from the store, dropping its undo log.
pub async fn refresh_session(
    state: &SharedState,
    game_id: Uuid,
) -> Result<SessionView, ServiceError> {
    let session = require_session(state, game_id)?;
    if session.is_busy() {
        return Err(ServiceError::InvalidState(
            "an update is still being persisted".into(),
        ));
    }

    let game = session.refresh().await?;
    sse_events::broadcast_session_opened(state, game_id, &game);
    Ok(session_view(&session).await)
}

/// Undo log of `game_id`, most recent first.
pub async fn history(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<HistoryEntryView>, ServiceError> {
    let session = require_session(state, game_id)?;
    Ok(session
        .history()
        .await
        .iter()
        .map(HistoryEntryView::from)
        .collect())
}

/// Credit runs; without an explicit half the current one is used.
pub async fn record_runs(
    state: &SharedState,
    game_id: Uuid,
    request: RecordRunsRequest,
) -> Result<MutationResponse, ServiceError> {
    request.validate()?;
    let half = match request.half {
        Some(half) => half,
        None => {
            require_session(state, game_id)?
                .snapshot()
                .await
                .current_inning_half
        }
    };
    execute(
        state,
        game_id,
        ScoringCommand::RecordRuns {
            runs: request.runs,
            half,
        },
    )
    .await
}

/// Set the out count of the current half-inning.
pub async fn change_outs(
    state: &SharedState,
    game_id: Uuid,
    request: ChangeOutsRequest,
) -> Result<MutationResponse, ServiceError> {
    request.validate()?;
    execute(
        state,
        game_id,
        ScoringCommand::ChangeOuts {
            outs: request.outs,
        },
    )
    .await
}

/// Apply `command` to the session of `game_id` and wait for the store.
///
/// The mutation runs on its own task so a dropped request cannot leave it
/// half settled. Subscribers see `score.updated` as soon as it is applied
/// locally, then `score.rolled_back` if the store refuses it.
pub async fn execute(
    state: &SharedState,
    game_id: Uuid,
    command: ScoringCommand,
) -> Result<MutationResponse, ServiceError> {
    if state.is_degraded().await {
        return Err(ServiceError::Degraded);
    }
    let session = require_session(state, game_id)?;

    let task_state = state.clone();
    let handle =
        tokio::spawn(async move { run_mutation(&task_state, &session, command).await });

    match handle.await {
        Ok(result) => result,
        Err(join_err) => {
            error!(%game_id, error = %join_err, "scoring task failed");
            Err(ServiceError::PersistenceFailed(
                "scoring task did not complete".into(),
            ))
        }
    }
}

async fn run_mutation(
    state: &SharedState,
    session: &ScoringSession,
    command: ScoringCommand,
) -> Result<MutationResponse, ServiceError> {
    let game_id = session.game_id();
    let Some(pending) = session.begin(command).await? else {
        let game = session.snapshot().await;
        return Ok(MutationResponse::nothing_to_undo(game_id, &game));
    };

    sse_events::broadcast_score_updated(state, game_id, pending.outcome());

    let persisted = session.persist(&pending).await;
    match session.settle(pending, persisted).await {
        Ok(outcome) => {
            if outcome.ready_to_advance {
                sse_events::broadcast_ready_to_advance(state, game_id, &outcome.state);
            }
            Ok(MutationResponse::confirmed(game_id, &outcome))
        }
        Err(err) => {
            if let ScoringError::PersistenceFailure { reason } = &err {
                let game = session.snapshot().await;
                sse_events::broadcast_score_rolled_back(
                    state,
                    game_id,
                    command.kind(),
                    reason,
                    &game,
                );
            }
            Err(err.into())
        }
    }
}

fn require_session(state: &SharedState, game_id: Uuid) -> Result<Arc<ScoringSession>, ServiceError> {
    state.session(game_id).ok_or_else(|| not_open(game_id))
}

fn not_open(game_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("no scoring session open for game `{game_id}`"))
}

async fn session_view(session: &ScoringSession) -> SessionView {
    SessionView {
        scoreboard: ScoreboardSnapshot::new(session.game_id(), &session.snapshot().await),
        can_undo: session.can_undo().await,
        busy: session.is_busy(),
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::Receiver;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::{GameStore, memory::MemoryGameStore, scripted::ScriptedGameStore},
        dto::sse::ServerEvent,
        scoring::game::{GameState, GameStatus, InningHalf},
        state::AppState,
    };

    async fn state_with(store: Arc<dyn GameStore>) -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.set_game_store(store).await;
        state
    }

    fn drain(rx: &mut Receiver<ServerEvent>) -> Vec<(String, serde_json::Value)> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push((
                event.event.unwrap_or_default(),
                serde_json::from_str(&event.data).unwrap(),
            ));
        }
        events
    }

    fn names(events: &[(String, serde_json::Value)]) -> Vec<&str> {
        events.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[tokio::test]
    async fn open_requires_a_store_and_a_row() {
        let id = Uuid::new_v4();
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            open_session(&state, id).await,
            Err(ServiceError::Degraded)
        ));

        state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        assert!(matches!(
            open_session(&state, id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            get_session(&state, id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn opening_twice_reuses_the_session() {
        let id = Uuid::new_v4();
        let state = state_with(Arc::new(MemoryGameStore::seeded([id]))).await;
        let mut rx = state.game_hub(id).subscribe();

        let first = open_session(&state, id).await.unwrap();
        execute(&state, id, ScoringCommand::StartGame).await.unwrap();
        let second = open_session(&state, id).await.unwrap();

        assert_eq!(first.scoreboard.status, GameStatus::Scheduled);
        assert_eq!(second.scoreboard.status, GameStatus::InProgress);
        assert!(second.can_undo);
        assert_eq!(state.sessions().len(), 1);
        assert_eq!(names(&drain(&mut rx)), vec!["session.opened", "score.updated"]);
    }

    #[tokio::test]
    async fn scoring_broadcasts_updates_and_advance_prompt() {
        let id = Uuid::new_v4();
        let state = state_with(Arc::new(MemoryGameStore::seeded([id]))).await;
        open_session(&state, id).await.unwrap();
        execute(&state, id, ScoringCommand::StartGame).await.unwrap();
        let mut rx = state.game_hub(id).subscribe();

        let runs = record_runs(&state, id, RecordRunsRequest { runs: 2, half: None })
            .await
            .unwrap();
        assert_eq!(runs.scoreboard.away_score, 2);
        assert_eq!(runs.scoreboard.away_inning_scores, vec![2]);

        let outs = change_outs(&state, id, ChangeOutsRequest { outs: 3 })
            .await
            .unwrap();
        assert!(outs.ready_to_advance);
        assert_eq!(outs.scoreboard.current_inning_half, InningHalf::Top);

        let events = drain(&mut rx);
        assert_eq!(
            names(&events),
            vec!["score.updated", "score.updated", "score.ready_to_advance"]
        );
        assert_eq!(events[0].1["action"], "record_runs");
        assert_eq!(events[0].1["scoreboard"]["away_score"], 2);
        assert_eq!(events[2].1["inning"], 1);
        assert_eq!(events[2].1["half"], "top");
    }

    #[tokio::test]
    async fn refused_update_is_rolled_back_and_announced() {
        let id = Uuid::new_v4();
        let store = ScriptedGameStore::with_game(
            id,
            GameState {
                status: GameStatus::InProgress,
                ..Default::default()
            },
        );
        let state = state_with(Arc::new(store.clone())).await;
        open_session(&state, id).await.unwrap();
        let mut rx = state.game_hub(id).subscribe();

        store.fail_next(1);
        let err = record_runs(
            &state,
            id,
            RecordRunsRequest {
                runs: 3,
                half: Some(InningHalf::Bottom),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::PersistenceFailed(_)));

        let events = drain(&mut rx);
        assert_eq!(names(&events), vec!["score.updated", "score.rolled_back"]);
        assert_eq!(events[0].1["scoreboard"]["home_score"], 3);
        assert_eq!(events[1].1["scoreboard"]["home_score"], 0);
        assert_eq!(events[1].1["action"], "record_runs");

        let view = get_session(&state, id).await.unwrap();
        assert_eq!(view.scoreboard.home_score, 0);
        assert!(!view.can_undo);
    }

    #[tokio::test]
    async fn invalid_actions_are_rejected_without_events() {
        let id = Uuid::new_v4();
        let state = state_with(Arc::new(MemoryGameStore::seeded([id]))).await;
        open_session(&state, id).await.unwrap();
        let mut rx = state.game_hub(id).subscribe();

        let err = execute(&state, id, ScoringCommand::AdvanceInning)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        execute(&state, id, ScoringCommand::StartGame).await.unwrap();
        drain(&mut rx);
        let err = change_outs(&state, id, ChangeOutsRequest { outs: 5 })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let err = record_runs(&state, id, RecordRunsRequest { runs: -1, half: None })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn undo_reports_empty_history() {
        let id = Uuid::new_v4();
        let state = state_with(Arc::new(MemoryGameStore::seeded([id]))).await;
        open_session(&state, id).await.unwrap();

        let response = execute(&state, id, ScoringCommand::Undo).await.unwrap();
        assert!(!response.applied);
        assert!(!response.can_undo);

        execute(&state, id, ScoringCommand::StartGame).await.unwrap();
        let history = history(&state, id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].description, "game started");

        let response = execute(&state, id, ScoringCommand::Undo).await.unwrap();
        assert!(response.applied);
        assert_eq!(response.scoreboard.status, GameStatus::Scheduled);
    }

    #[tokio::test]
    async fn close_and_refresh() {
        let id = Uuid::new_v4();
        let store = MemoryGameStore::seeded([id]);
        let state = state_with(Arc::new(store.clone())).await;
        open_session(&state, id).await.unwrap();
        execute(&state, id, ScoringCommand::StartGame).await.unwrap();

        let mut remote = store.get(id).unwrap();
        remote.away_score = 4;
        remote.away_inning_scores = vec![4];
        store.insert(id, remote);

        let view = refresh_session(&state, id).await.unwrap();
        assert_eq!(view.scoreboard.away_score, 4);
        assert!(!view.can_undo);

        let mut rx = state.game_hub(id).subscribe();
        close_session(&state, id).unwrap();
        assert_eq!(names(&drain(&mut rx)), vec!["session.closed"]);
        assert!(matches!(
            close_session(&state, id),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            execute(&state, id, ScoringCommand::EndGame).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}

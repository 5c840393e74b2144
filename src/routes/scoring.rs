use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::scoring::{
        ChangeOutsRequest, HistoryEntryView, MutationResponse, RecordRunsRequest, SessionView,
    },
    error::AppError,
    scoring::session::ScoringCommand,
    services::scoring_service,
    state::SharedState,
};

/// Operator endpoints driving the scoring session of a game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/games/{id}/session",
            post(open_session).get(get_session).delete(close_session),
        )
        .route("/games/{id}/session/refresh", post(refresh_session))
        .route("/games/{id}/session/history", get(history))
        .route("/games/{id}/runs", post(record_runs))
        .route("/games/{id}/outs", post(change_outs))
        .route("/games/{id}/inning/advance", post(advance_inning))
        .route("/games/{id}/start", post(start_game))
        .route("/games/{id}/suspend", post(suspend_game))
        .route("/games/{id}/end", post(end_game))
        .route("/games/{id}/undo", post(undo))
}

/// Load a game from the store and open a scoring session on it.
#[utoipa::path(
    post,
    path = "/games/{id}/session",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the game to score")),
    responses(
        (status = 200, description = "Session open", body = SessionView),
        (status = 404, description = "Unknown game"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn open_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(scoring_service::open_session(&state, id).await?))
}

/// Current scoreboard of an open session.
#[utoipa::path(
    get,
    path = "/games/{id}/session",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 200, description = "Session state", body = SessionView),
        (status = 404, description = "No session open for this game")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(scoring_service::get_session(&state, id).await?))
}

/// Close the session and discard its undo log.
#[utoipa::path(
    delete,
    path = "/games/{id}/session",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "No session open for this game")
    )
)]
pub async fn close_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    scoring_service::close_session(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reload the game from the store, dropping the undo log.
#[utoipa::path(
    post,
    path = "/games/{id}/session/refresh",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 200, description = "Session reloaded", body = SessionView),
        (status = 409, description = "An update is still being persisted")
    )
)]
pub async fn refresh_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(scoring_service::refresh_session(&state, id).await?))
}

/// Undoable actions, most recent first.
#[utoipa::path(
    get,
    path = "/games/{id}/session/history",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses((status = 200, description = "Undo log", body = [HistoryEntryView]))
)]
pub async fn history(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HistoryEntryView>>, AppError> {
    Ok(Json(scoring_service::history(&state, id).await?))
}

/// Credit runs to the batting team of the current inning.
#[utoipa::path(
    post,
    path = "/games/{id}/runs",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    request_body = RecordRunsRequest,
    responses(
        (status = 200, description = "Runs recorded", body = MutationResponse),
        (status = 400, description = "Negative run count"),
        (status = 409, description = "Game is not in progress"),
        (status = 503, description = "Update could not be persisted and was rolled back")
    )
)]
pub async fn record_runs(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RecordRunsRequest>>,
) -> Result<Json<MutationResponse>, AppError> {
    Ok(Json(scoring_service::record_runs(&state, id, payload).await?))
}

/// Set the out count; three outs prompt the operator to advance.
#[utoipa::path(
    post,
    path = "/games/{id}/outs",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    request_body = ChangeOutsRequest,
    responses(
        (status = 200, description = "Outs updated", body = MutationResponse),
        (status = 400, description = "Out count outside 0..=3"),
        (status = 409, description = "Game is not in progress"),
        (status = 503, description = "Update could not be persisted and was rolled back")
    )
)]
pub async fn change_outs(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ChangeOutsRequest>>,
) -> Result<Json<MutationResponse>, AppError> {
    Ok(Json(scoring_service::change_outs(&state, id, payload).await?))
}

/// Move to the next half-inning.
#[utoipa::path(
    post,
    path = "/games/{id}/inning/advance",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 200, description = "Half-inning advanced", body = MutationResponse),
        (status = 409, description = "Game is not in progress")
    )
)]
pub async fn advance_inning(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MutationResponse>, AppError> {
    command(state, id, ScoringCommand::AdvanceInning).await
}

/// Start a scheduled game or resume a suspended one.
#[utoipa::path(
    post,
    path = "/games/{id}/start",
    tag = "lifecycle",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 200, description = "Game in progress", body = MutationResponse),
        (status = 409, description = "Game cannot be started from its status")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MutationResponse>, AppError> {
    command(state, id, ScoringCommand::StartGame).await
}

/// Suspend a game in progress.
#[utoipa::path(
    post,
    path = "/games/{id}/suspend",
    tag = "lifecycle",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 200, description = "Game suspended", body = MutationResponse),
        (status = 409, description = "Game is not in progress")
    )
)]
pub async fn suspend_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MutationResponse>, AppError> {
    command(state, id, ScoringCommand::SuspendGame).await
}

/// End the game.
#[utoipa::path(
    post,
    path = "/games/{id}/end",
    tag = "lifecycle",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 200, description = "Game final", body = MutationResponse),
        (status = 409, description = "Game is neither in progress nor suspended")
    )
)]
pub async fn end_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MutationResponse>, AppError> {
    command(state, id, ScoringCommand::EndGame).await
}

/// Revert the most recent action; `applied` is false when there was none.
#[utoipa::path(
    post,
    path = "/games/{id}/undo",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the scored game")),
    responses(
        (status = 200, description = "Last action reverted", body = MutationResponse),
        (status = 409, description = "Game is final")
    )
)]
pub async fn undo(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MutationResponse>, AppError> {
    command(state, id, ScoringCommand::Undo).await
}

async fn command(
    state: SharedState,
    id: Uuid,
    command: ScoringCommand,
) -> Result<Json<MutationResponse>, AppError> {
    Ok(Json(scoring_service::execute(&state, id, command).await?))
}

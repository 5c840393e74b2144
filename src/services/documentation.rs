use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live scoring backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::game_stream,
        crate::routes::scoring::open_session,
        crate::routes::scoring::get_session,
        crate::routes::scoring::close_session,
        crate::routes::scoring::refresh_session,
        crate::routes::scoring::history,
        crate::routes::scoring::record_runs,
        crate::routes::scoring::change_outs,
        crate::routes::scoring::advance_inning,
        crate::routes::scoring::start_game,
        crate::routes::scoring::suspend_game,
        crate::routes::scoring::end_game,
        crate::routes::scoring::undo,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::scoring::ScoreboardSnapshot,
            crate::dto::scoring::SessionView,
            crate::dto::scoring::HistoryEntryView,
            crate::dto::scoring::RecordRunsRequest,
            crate::dto::scoring::ChangeOutsRequest,
            crate::dto::scoring::MutationResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::ScoreUpdatedEvent,
            crate::dto::sse::ScoreRolledBackEvent,
            crate::dto::sse::ReadyToAdvanceEvent,
            crate::dto::sse::SessionOpenedEvent,
            crate::dto::sse::SessionClosedEvent,
            crate::scoring::game::GameStatus,
            crate::scoring::game::InningHalf,
            crate::scoring::lifecycle::ActionKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Live scoreboard streams"),
        (name = "scoring", description = "Operator scoring actions"),
        (name = "lifecycle", description = "Game start, suspension and end"),
    )
)]
/// OpenAPI document of the HTTP API.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_scoring_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/games/{id}/session",
            "/games/{id}/session/refresh",
            "/games/{id}/session/history",
            "/games/{id}/runs",
            "/games/{id}/outs",
            "/games/{id}/inning/advance",
            "/games/{id}/start",
            "/games/{id}/suspend",
            "/games/{id}/end",
            "/games/{id}/undo",
            "/sse/games/{id}",
            "/healthcheck",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of games currently being scored.
    pub open_sessions: usize,
}

impl HealthResponse {
    /// The store answers.
    pub fn ok(open_sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            open_sessions,
        }
    }

    /// No store is installed or it stopped answering.
    pub fn degraded(open_sessions: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            open_sessions,
        }
    }
}

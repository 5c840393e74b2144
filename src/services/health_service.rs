use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the installed store and report whether scoring can be persisted.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let open_sessions = state.sessions().len();
    let healthy = match state.require_game_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => !state.is_degraded().await,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                false
            }
        },
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            false
        }
    };

    if healthy {
        HealthResponse::ok(open_sessions)
    } else {
        HealthResponse::degraded(open_sessions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::game_store::memory::MemoryGameStore, state::AppState};

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.open_sessions, 0);
    }
}

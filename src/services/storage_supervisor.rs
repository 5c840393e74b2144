use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{game_store::GameStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECOVERY_ATTEMPTS: u32 = 3;

/// Connect to the storage backend and keep the shared state in degraded mode while it is unavailable.
///
/// Sessions opened before a reconnect keep the store handle they were opened
/// with; only new sessions pick up a freshly connected store.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_game_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store.as_ref()).await;

                state.clear_game_store().await;
                warn!("storage lost; reconnecting");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll `store` until it fails [`MAX_RECOVERY_ATTEMPTS`] checks in a row.
async fn watch_health(state: &SharedState, store: &dyn GameStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true).await;

                let mut retry_delay = INITIAL_DELAY;
                let mut recovered = false;
                for attempt in 1..=MAX_RECOVERY_ATTEMPTS {
                    sleep(retry_delay).await;
                    match store.health_check().await {
                        Ok(()) => {
                            info!(attempt, "storage answered again");
                            recovered = true;
                            break;
                        }
                        Err(err) => {
                            warn!(attempt, error = %err, "storage recovery attempt failed");
                            retry_delay = (retry_delay * 2).min(MAX_DELAY);
                        }
                    }
                }

                if !recovered {
                    warn!("exhausted storage recovery attempts; dropping connection");
                    return;
                }
                state.update_degraded(false).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::game_store::memory::MemoryGameStore, state::AppState};

    #[tokio::test]
    async fn installs_store_once_connected() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();

        let task = tokio::spawn(run(state.clone(), || async {
            Ok::<_, StorageError>(Arc::new(MemoryGameStore::new()) as Arc<dyn GameStore>)
        }));

        watcher.wait_for(|degraded| !degraded).await.unwrap();
        assert!(state.game_store().await.is_some());
        task.abort();
    }
}

/// Store backed by the league application's REST API.
#[cfg(feature = "http-store")]
pub mod http;
/// In-process store.
pub mod memory;
/// Test double with scripted failures and stalls.
#[cfg(test)]
pub mod scripted;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::storage::StorageResult;
use crate::scoring::game::{GameState, GameStatePatch};

/// Persistence collaborator owning the long-lived game rows.
pub trait GameStore: Send + Sync {
    /// Fetch the current row for `game_id`, `None` when it does not exist.
    fn load_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameState>>>;
    /// Atomically upsert `patch` into the row and return the stored result.
    fn persist_game_update(
        &self,
        game_id: Uuid,
        patch: GameStatePatch,
    ) -> BoxFuture<'static, StorageResult<GameState>>;
    /// Cheap liveness probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

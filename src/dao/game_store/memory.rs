use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, storage::StorageResult},
    scoring::game::{GameState, GameStatePatch},
};

/// Process-local [`GameStore`] used when no league API is configured.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    games: Arc<DashMap<Uuid, GameState>>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding a fresh scheduled row for every id.
    pub fn seeded(ids: impl IntoIterator<Item = Uuid>) -> Self {
        let store = Self::new();
        for id in ids {
            store.insert(id, GameState::default());
        }
        store
    }

    /// Replace the row for `id`.
    pub fn insert(&self, id: Uuid, game: GameState) {
        self.games.insert(id, game);
    }

    /// Current row for `id`.
    pub fn get(&self, id: Uuid) -> Option<GameState> {
        self.games.get(&id).map(|entry| entry.value().clone())
    }
}

impl GameStore for MemoryGameStore {
    fn load_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameState>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.get(game_id)) })
    }

    fn persist_game_update(
        &self,
        game_id: Uuid,
        patch: GameStatePatch,
    ) -> BoxFuture<'static, StorageResult<GameState>> {
        let store = self.clone();
        Box::pin(async move {
            // The entry guard keeps the read-modify-write atomic per game.
            let mut entry = store.games.entry(game_id).or_default();
            entry.apply_patch(&patch);
            Ok(entry.value().clone())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

//! Controllable [`GameStore`] double for coordinator and service tests.

use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use futures::future::BoxFuture;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::{GameStore, memory::MemoryGameStore},
        storage::{StorageError, StorageResult},
    },
    scoring::game::{GameState, GameStatePatch},
};

/// In-memory store whose persist calls can be made to fail or wait.
#[derive(Clone, Default)]
pub struct ScriptedGameStore {
    inner: MemoryGameStore,
    failures: Arc<AtomicUsize>,
    hold: Arc<AtomicBool>,
    release: Arc<Notify>,
    entered: Arc<Notify>,
    patches: Arc<Mutex<Vec<GameStatePatch>>>,
}

impl ScriptedGameStore {
    /// Store seeded with a single row.
    pub fn with_game(id: Uuid, game: GameState) -> Self {
        let store = Self::default();
        store.inner.insert(id, game);
        store
    }

    /// Make the next `count` persist calls fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Park every persist call until [`Self::release`] is called.
    pub fn hold_persists(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Let parked persist calls continue.
    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    /// Resolve once a persist call has started.
    pub async fn persist_started(&self) {
        self.entered.notified().await;
    }

    /// Overwrite the row of `id`, bypassing the persist path.
    pub fn insert(&self, id: Uuid, game: GameState) {
        self.inner.insert(id, game);
    }

    /// Row currently held for `id`.
    pub fn stored(&self, id: Uuid) -> Option<GameState> {
        self.inner.get(id)
    }

    /// Every patch received so far, in order.
    pub fn patches(&self) -> Vec<GameStatePatch> {
        self.patches.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl GameStore for ScriptedGameStore {
    fn load_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameState>>> {
        self.inner.load_game(game_id)
    }

    fn persist_game_update(
        &self,
        game_id: Uuid,
        patch: GameStatePatch,
    ) -> BoxFuture<'static, StorageResult<GameState>> {
        let store = self.clone();
        Box::pin(async move {
            if let Ok(mut patches) = store.patches.lock() {
                patches.push(patch.clone());
            }

            let released = store.release.notified();
            store.entered.notify_one();
            if store.hold.load(Ordering::SeqCst) {
                released.await;
            }

            let failing = store
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(StorageError::unavailable(
                    "scripted failure".into(),
                    io::Error::other("league api unreachable"),
                ));
            }

            store.inner.persist_game_update(game_id, patch).await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }
}

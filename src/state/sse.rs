use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// SSE-specific sub-state carved out from [`AppState`](super::AppState): one
/// broadcast hub per scored game, created on first use.
pub struct SseState {
    capacity: usize,
    games: DashMap<Uuid, SseHub>,
}

impl SseState {
    /// Build the SSE sub-tree with the per-game channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            games: DashMap::new(),
        }
    }

    /// Hub for `game_id`, created when missing.
    pub fn game(&self, game_id: Uuid) -> SseHub {
        self.games
            .entry(game_id)
            .or_insert_with(|| SseHub::new(self.capacity))
            .clone()
    }

    /// Drop the hub of `game_id` once nobody listens to it anymore.
    pub fn release_if_idle(&self, game_id: Uuid) {
        self.games
            .remove_if(&game_id, |_, hub| hub.receiver_count() == 0);
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

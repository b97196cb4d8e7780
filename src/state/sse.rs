use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Per-room SSE hubs, created on first subscription.
pub struct RoomHubs {
    hubs: DashMap<String, Arc<SseHub>>,
    capacity: usize,
}

impl RoomHubs {
    /// Registry whose hubs buffer up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to the events of room `code`.
    pub fn subscribe(&self, code: &str) -> broadcast::Receiver<ServerEvent> {
        self.hubs
            .entry(code.to_owned())
            .or_insert_with(|| Arc::new(SseHub::new(self.capacity)))
            .subscribe()
    }

    /// Send `event` to the subscribers of room `code`, if any.
    pub fn broadcast(&self, code: &str, event: ServerEvent) {
        let Some(hub) = self.hubs.get(code).map(|hub| Arc::clone(hub.value())) else {
            return;
        };
        hub.broadcast(event);
    }

    /// Drop the hub of room `code` once nobody listens anymore.
    pub fn release(&self, code: &str) {
        self.hubs
            .remove_if(code, |_, hub| hub.receiver_count() == 0);
    }

    /// Number of rooms with a live hub.
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    /// Whether no room has a live hub.
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
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

    /// Live subscriber count.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

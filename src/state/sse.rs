use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Lazily created broadcast hubs, one per tournament room code.
pub struct RoomHubs {
    hubs: DashMap<String, SseHub>,
    capacity: usize,
}

impl RoomHubs {
    /// Build an empty registry whose hubs buffer `capacity` events each.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Register a new subscriber for `code`, creating the hub on first use.
    pub fn subscribe(&self, code: &str) -> broadcast::Receiver<ServerEvent> {
        self.hubs
            .entry(code.to_owned())
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Send an event to the room's subscribers. Rooms nobody watches are skipped.
    pub fn broadcast(&self, code: &str, event: ServerEvent) {
        if let Some(hub) = self.hubs.get(code) {
            hub.broadcast(event);
        }
    }

    /// Whether the room currently has at least one open receiver.
    pub fn has_subscribers(&self, code: &str) -> bool {
        self.hubs
            .get(code)
            .is_some_and(|hub| hub.receiver_count() > 0)
    }

    /// Number of rooms with a hub.
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    /// Whether no room has a hub.
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Drop the hub of a torn-down room; open streams end once their receiver closes.
    pub fn remove(&self, code: &str) {
        self.hubs.remove(code);
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

    /// Number of receivers still attached to the hub.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_only_their_room() {
        let hubs = RoomHubs::new(4);
        let mut putt = hubs.subscribe("PUTT1");
        let mut other = hubs.subscribe("OTHER");

        hubs.broadcast("PUTT1", ServerEvent::new(Some("ping".into()), "{}".into()));

        let received = putt.recv().await.unwrap();
        assert_eq!(received.event.as_deref(), Some("ping"));
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn removing_a_hub_closes_its_receivers() {
        let hubs = RoomHubs::new(4);
        let mut receiver = hubs.subscribe("GONE1");
        hubs.remove("GONE1");
        assert!(!hubs.has_subscribers("GONE1"));
        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[test]
    fn hub_without_receivers_has_no_subscribers() {
        let hubs = RoomHubs::new(4);
        let receiver = hubs.subscribe("IDLE1");
        assert!(hubs.has_subscribers("IDLE1"));
        drop(receiver);
        assert!(!hubs.has_subscribers("IDLE1"));
        assert!(!hubs.has_subscribers("NEVER"));
    }
}

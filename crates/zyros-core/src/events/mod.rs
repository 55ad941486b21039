//! Client-wide event bus
//!
//! Components that must not know about each other talk through here: the
//! transport announces a 401 and the session store resets itself, mutations
//! report their outcome and the CLI turns that into notifications, the query
//! cache reports which keys an invalidation touched.

use crate::auth::SessionState;
use crate::cache::QueryKey;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events published through the [`EventBus`]
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    // ========== Session Events ==========
    /// The session store moved to a new state
    SessionChanged(SessionState),

    /// The API rejected the bearer token; storage was already cleared
    Unauthorized { url: Option<String> },

    // ========== Navigation ==========
    /// The client must move to another path (e.g. `/login` after a 401)
    Navigate { to: String },

    // ========== Cache Events ==========
    /// Entries were marked stale
    QueryInvalidated {
        prefixes: Vec<QueryKey>,
        matched: usize,
    },

    // ========== Mutation Events ==========
    /// A write was acknowledged by the API
    MutationSucceeded { kind: &'static str },

    /// A write failed; nothing was invalidated
    MutationFailed { kind: &'static str, message: String },
}

impl ClientEvent {
    /// Create a navigation event
    pub fn navigate(to: impl Into<String>) -> Self {
        Self::Navigate { to: to.into() }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionChanged(_) => "session_changed",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Navigate { .. } => "navigate",
            Self::QueryInvalidated { .. } => "query_invalidated",
            Self::MutationSucceeded { .. } => "mutation_succeeded",
            Self::MutationFailed { .. } => "mutation_failed",
        }
    }
}

/// Event bus for client-wide event distribution
///
/// Backed by a broadcast channel; each subscriber receives a copy of every
/// event published after it subscribed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with the specified capacity
    ///
    /// Slow subscribers start losing events once `capacity` are buffered.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of receivers, 0 when nobody listens.
    pub fn publish(&self, event: ClientEvent) -> usize {
        tracing::trace!(event = event.event_type(), "publishing client event");
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    /// Create a default event bus with capacity of 256 events
    fn default() -> Self {
        Self::new(256)
    }
}

/// Thread-safe wrapper around EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Create a new shared event bus
pub fn shared_event_bus(capacity: usize) -> SharedEventBus {
    Arc::new(EventBus::new(capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_basic() {
        let bus = EventBus::new(16);
        let mut subscriber = bus.subscribe();

        let sent = bus.publish(ClientEvent::navigate("/login"));
        assert_eq!(sent, 1);

        let event = subscriber.recv().await.unwrap();
        assert_eq!(event, ClientEvent::Navigate { to: "/login".into() });
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(ClientEvent::MutationSucceeded { kind: "like_post" }), 0);
    }

    #[tokio::test]
    async fn test_clone_bus_shares_channel() {
        let bus1 = EventBus::new(16);
        let bus2 = bus1.clone();
        let mut sub = bus1.subscribe();

        bus2.publish(ClientEvent::Unauthorized { url: None });

        let event = sub.recv().await.unwrap();
        assert_eq!(event.event_type(), "unauthorized");
        assert_eq!(bus1.subscriber_count(), 1);
    }
}

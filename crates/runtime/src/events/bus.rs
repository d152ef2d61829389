//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::broadcast;

use super::types::{AlertEvent, CueEvent, GameDataEvent, NavigationEvent, SessionEvent};

/// Topics for event routing
#[derive(
    Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, strum::EnumIter,
)]
pub enum Topic {
    /// Battle list refreshes
    GameData,
    /// Notification slot changes
    Alert,
    /// Screen changes
    Navigation,
    /// Visual cues (hits)
    Cue,
    /// Identity, onboarding step and registration
    Session,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    GameData(GameDataEvent),
    Alert(AlertEvent),
    Navigation(NavigationEvent),
    Cue(CueEvent),
    Session(SessionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::GameData(_) => Topic::GameData,
            Event::Alert(_) => Topic::Alert,
            Event::Navigation(_) => Topic::Navigation,
            Event::Cue(_) => Topic::Cue,
            Event::Session(_) => Topic::Session,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels are created up front for every topic,
/// so the map is immutable after construction.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Unreachable: every topic gets a channel in `with_capacity`.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

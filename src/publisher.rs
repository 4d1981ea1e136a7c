//! Publisher adapter (component F).
//!
//! The core only depends on the [`Publisher`] trait; the concrete transport
//! that relays events to a developer's UI (WebSocket, SSE, ...) is external.
//! [`BroadcastPublisher`] is the one concrete, in-process implementation
//! shipped here: enough to exercise and test the contract, and a drop-in
//! base for a real transport to wrap.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::event::{Event, Topic};

const CHANNEL_CAPACITY: usize = 256;

/// Best-effort, non-blocking event sink. A no-op subscriber must never
/// fail or stall the exchange that triggered the event.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, client_id: &str, topic: Topic, payload: serde_json::Value);
}

/// In-process fan-out keyed by client id, backed by a broadcast channel per
/// client. `publish` is a no-op when no observer has subscribed.
#[derive(Default)]
pub struct BroadcastPublisher {
    channels: RwLock<HashMap<String, broadcast::Sender<Event>>>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events for `client_id`, creating its channel if needed.
    pub fn subscribe(&self, client_id: &str) -> broadcast::Receiver<Event> {
        let mut channels = self.channels.write().expect("publisher lock poisoned");
        channels
            .entry(client_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

#[async_trait]
impl Publisher for BroadcastPublisher {
    async fn publish(&self, client_id: &str, topic: Topic, payload: serde_json::Value) {
        let sender = {
            let channels = self.channels.read().expect("publisher lock poisoned");
            channels.get(client_id).cloned()
        };
        if let Some(sender) = sender {
            let event = Event {
                client_id: client_id.to_string(),
                topic,
                payload,
            };
            // No receivers is not an error: best-effort delivery.
            let _ = sender.send(event);
        }
    }
}

/// Discards every event. Useful where a publisher is required but no
/// observer transport has been wired up.
#[derive(Default)]
pub struct NoopPublisher;

#[async_trait]
impl Publisher for NoopPublisher {
    async fn publish(&self, _client_id: &str, _topic: Topic, _payload: serde_json::Value) {}
}

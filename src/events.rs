use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use uuid::Uuid;

/// Live-update event pushed to connected clients. Best effort, at most once,
/// no persistence.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub kind: String,
    pub user_id: Uuid,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn cart_updated(user_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            kind: "cart.updated".into(),
            user_id,
            payload,
        }
    }
}

/// Fan-out dispatcher keyed by connection id. Owned by `AppState`, so its
/// lifetime is the server process.
#[derive(Default)]
pub struct EventBus {
    clients: Mutex<HashMap<Uuid, UnboundedSender<String>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> (Uuid, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let id = Uuid::new_v4();
        self.clients
            .lock()
            .expect("event registry poisoned")
            .insert(id, tx);
        (id, rx)
    }

    pub fn unsubscribe(&self, id: Uuid) {
        self.clients
            .lock()
            .expect("event registry poisoned")
            .remove(&id);
    }

    /// Fan out to every subscriber; connections whose channel is gone are
    /// dropped from the registry.
    pub fn publish(&self, event: &Event) {
        let encoded = match serde_json::to_string(event) {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode event");
                return;
            }
        };

        let mut clients = self.clients.lock().expect("event registry poisoned");
        clients.retain(|_, tx| tx.send(encoded.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.clients.lock().expect("event registry poisoned").len()
    }
}

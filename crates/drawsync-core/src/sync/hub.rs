//! In-process fan-out broker.
//!
//! Mirrors what the network relay does, for tests and for several sessions
//! sharing one process: every published frame is queued for every other
//! subscriber, and nothing is ever echoed back to its sender.

use super::{SyncChannel, SyncError, decode_message, encode_operation};
use crate::operation::{DrawOperation, DrawingEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Queues = HashMap<Uuid, VecDeque<String>>;

/// Shared broker. Cloning yields another handle to the same broker.
#[derive(Clone, Default)]
pub struct LocalHub {
    queues: Arc<Mutex<Queues>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a new participant.
    pub fn connect(&self) -> HubChannel {
        let id = Uuid::new_v4();
        if let Ok(mut queues) = self.queues.lock() {
            queues.insert(id, VecDeque::new());
        }
        log::debug!("Hub subscriber {} connected", id);
        HubChannel {
            id,
            hub: self.clone(),
        }
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.queues.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Deliver a raw frame to every subscriber, as if an outside peer sent it.
    pub fn publish_raw(&self, text: &str) {
        self.fan_out(None, text);
    }

    fn fan_out(&self, sender: Option<Uuid>, text: &str) -> bool {
        let Ok(mut queues) = self.queues.lock() else {
            return false;
        };
        for (id, queue) in queues.iter_mut() {
            if Some(*id) != sender {
                queue.push_back(text.to_string());
            }
        }
        true
    }

    fn take(&self, id: Uuid) -> Vec<String> {
        self.queues
            .lock()
            .ok()
            .and_then(|mut queues| queues.get_mut(&id).map(|q| q.drain(..).collect()))
            .unwrap_or_default()
    }

    fn disconnect(&self, id: Uuid) {
        if let Ok(mut queues) = self.queues.lock() {
            queues.remove(&id);
        }
        log::debug!("Hub subscriber {} disconnected", id);
    }
}

/// One participant's handle on a [`LocalHub`].
pub struct HubChannel {
    id: Uuid,
    hub: LocalHub,
}

impl HubChannel {
    /// Subscriber id on the hub.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl SyncChannel for HubChannel {
    fn publish(&mut self, op: &DrawOperation) -> Result<(), SyncError> {
        let text = encode_operation(op)?;
        if self.hub.fan_out(Some(self.id), &text) {
            Ok(())
        } else {
            Err(SyncError::Send("hub lock poisoned".to_string()))
        }
    }

    fn poll_remote(&mut self) -> Vec<DrawingEvent> {
        self.hub
            .take(self.id)
            .iter()
            .filter_map(|text| decode_message(text))
            .collect()
    }
}

impl Drop for HubChannel {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}

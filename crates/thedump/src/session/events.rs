//! Session change broadcasting for observers of the session list.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use super::item::{SessionItem, UploadStatus};

/// One applied mutation of the session list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A capture was inserted at the front of the list.
    ItemAdded { item: SessionItem },
    /// An item's status moved forward.
    StatusChanged {
        id: String,
        status: UploadStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_uuid: Option<String>,
    },
    /// An item was dropped from the list after being organized.
    ItemRemoved { id: String },
    /// The whole list was emptied.
    Cleared,
}

impl SessionEvent {
    /// Id of the affected item, if the event concerns a single item.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            SessionEvent::ItemAdded { item } => Some(&item.id),
            SessionEvent::StatusChanged { id, .. } | SessionEvent::ItemRemoved { id } => Some(id),
            SessionEvent::Cleared => None,
        }
    }
}

/// Broadcasts session events to any number of subscribers.
#[derive(Clone)]
pub struct SessionEventBroadcaster {
    sender: Arc<broadcast::Sender<SessionEvent>>,
}

impl SessionEventBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: SessionEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionEventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

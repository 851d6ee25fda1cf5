use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::EditorEvent;

/// In-process event bus backed by `tokio::broadcast`. One bus serves all
/// documents; subscribers filter by document id.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<EditorEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers. Dropped silently when no
    /// one is listening; events are advisory, not state.
    pub fn publish(&self, event: EditorEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

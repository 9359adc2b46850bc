use std::sync::Arc;

use otime_types::event::EventType;
use tokio::sync::broadcast;

/// Downstream update channel: connected observers learn that an event's data
/// changed and can re-query. Delivery is best-effort and non-blocking; a send
/// without subscribers is not an error.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Arc<EventType>>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Notifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<EventType>> {
        self.tx.subscribe()
    }

    pub fn update_event(&self, event: &EventType) {
        let _ = self.tx.send(Arc::new(event.clone()));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new(256)
    }
}

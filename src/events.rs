use tokio::sync::broadcast;

use crate::models::SignupStatus;

/// Domain events emitted after a coordinator mutation commits.
///
/// Subscribers (UI refresh, notification fan-out) consume these instead of
/// watching the ledger for changes; the coordinator itself never depends on
/// anyone listening.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    SignupChanged {
        shift_id: String,
        user_id: String,
        status: SignupStatus,
    },
    TokenRedeemed {
        shift_id: String,
        user_id: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Dropped silently when nobody is subscribed.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

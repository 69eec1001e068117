use crate::message::Envelope;
use dashmap::DashMap;
use log::*;
use tokio::sync::mpsc::UnboundedSender;

/// Unique identifier for a subscriber channel (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of currently connected push channels.
///
/// Channels are best-effort: a send failure on one channel is logged and
/// skipped so the remaining channels still receive the event. Dead channels
/// are removed when the transport signals disconnection, not here.
pub struct SubscriberRegistry {
    subscribers: DashMap<SubscriberId, UnboundedSender<Envelope>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Register a new channel - O(1)
    pub fn register(&self, sender: UnboundedSender<Envelope>) -> SubscriberId {
        let subscriber_id = SubscriberId::new();
        self.subscribers.insert(subscriber_id.clone(), sender);
        subscriber_id
    }

    /// Remove a channel - O(1). Removing an id that is already gone is a
    /// no-op.
    pub fn unregister(&self, subscriber_id: &SubscriberId) {
        self.subscribers.remove(subscriber_id);
    }

    /// Number of currently registered channels.
    pub fn count(&self) -> usize {
        self.subscribers.len()
    }

    /// Write one envelope to a single channel (used for the connection
    /// acknowledgment).
    pub fn send_to(&self, subscriber_id: &SubscriberId, envelope: Envelope) {
        if let Some(sender) = self.subscribers.get(subscriber_id) {
            if let Err(e) = sender.send(envelope) {
                warn!(
                    "Failed to send event to subscriber {}: {}",
                    subscriber_id.as_str(),
                    e
                );
            }
        }
    }

    /// Write one envelope to every registered channel, returning how many
    /// channels accepted it.
    pub fn broadcast(&self, envelope: Envelope) -> usize {
        let mut delivered = 0;
        for entry in self.subscribers.iter() {
            if let Err(e) = entry.value().send(envelope.clone()) {
                warn!(
                    "Failed to send {} event to subscriber {}: {}",
                    envelope.event,
                    entry.key().as_str(),
                    e
                );
            } else {
                delivered += 1;
            }
        }
        delivered
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn envelope() -> Envelope {
        Envelope {
            event: "email-instruction",
            data: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_all_registered_channels() {
        let registry = SubscriberRegistry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry.register(tx_a);
        registry.register(tx_b);

        assert_eq!(registry.broadcast(envelope()), 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_skips_dead_channel_and_still_delivers_to_the_rest() {
        let registry = SubscriberRegistry::new();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        registry.register(tx_dead);
        registry.register(tx_live);
        drop(rx_dead);

        assert_eq!(registry.broadcast(envelope()), 1);
        assert!(rx_live.try_recv().is_ok());
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let subscriber_id = registry.register(tx);

        registry.unregister(&subscriber_id);
        registry.unregister(&subscriber_id);
        assert_eq!(registry.count(), 0);
        assert_eq!(registry.broadcast(envelope()), 0);
    }
}

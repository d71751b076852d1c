use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::SiteEvent;

/// In-process event bus backed by `tokio::broadcast`.
/// Single-node; preview listeners subscribe per connection.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<SiteEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: SiteEvent) -> Result<usize, broadcast::error::SendError<SiteEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(SiteEvent::Welcome).unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, SiteEvent::Welcome));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(SiteEvent::Reconnect).unwrap();

        assert!(matches!(rx1.recv().await.unwrap(), SiteEvent::Reconnect));
        assert!(matches!(rx2.recv().await.unwrap(), SiteEvent::Reconnect));
    }
}

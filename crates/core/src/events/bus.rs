use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::GalleryEvent;

/// In-process event bus backed by `tokio::broadcast`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<GalleryEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers. Returns how many
    /// subscribers saw it; nobody listening is not an error.
    pub fn publish(&self, event: GalleryEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "no event subscribers");
                0
            }
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
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
    use chrono::Utc;

    use super::*;
    use crate::events::types::BasketEvent;
    use crate::ids::UserId;

    fn basket_event() -> GalleryEvent {
        GalleryEvent::BasketUpdated(BasketEvent {
            user_id: UserId::new_random(),
            item_count: 2,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(basket_event()), 1);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, GalleryEvent::BasketUpdated(BasketEvent { item_count: 2, .. })));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(basket_event());

        assert!(matches!(rx1.recv().await.unwrap(), GalleryEvent::BasketUpdated(_)));
        assert!(matches!(rx2.recv().await.unwrap(), GalleryEvent::BasketUpdated(_)));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(basket_event()), 0);
    }
}

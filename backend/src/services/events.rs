//! Event bus for roast control events

use roast_core::control::RoastEvent;
use tokio::sync::broadcast;

/// Typed broadcast of [`RoastEvent`]s
///
/// Publishing never blocks. Subscribers that fall behind by more than the
/// channel capacity observe a `Lagged` error and continue from the newest
/// retained event.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RoastEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: RoastEvent) {
        tracing::debug!(?event, "roast event");
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoastEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roast_core::RoastStatus;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(RoastEvent::PhaseChanged {
            from: RoastStatus::Idle,
            to: RoastStatus::Preheating,
        });
        bus.publish(RoastEvent::SessionReset);

        assert!(matches!(
            rx.recv().await.unwrap(),
            RoastEvent::PhaseChanged { .. }
        ));
        assert_eq!(rx.recv().await.unwrap(), RoastEvent::SessionReset);
    }

    #[test]
    fn test_publish_without_subscribers() {
        EventBus::new(1).publish(RoastEvent::SessionReset);
    }
}

//! Domain event delivery. The core publishes; delivery channels (in-app,
//! email, WhatsApp) subscribe to the broadcast stream.

use tokio::sync::broadcast;

use crate::domain::DomainEvent;

pub trait EventSink: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastNotifier {
    fn publish(&self, event: DomainEvent) {
        tracing::info!(
            kind = ?event.kind,
            short_id = %event.short_id,
            old_status = %event.old_status,
            new_status = %event.new_status,
            "Domain event"
        );
        // No subscriber is not an error: events are fire-and-forget.
        if self.sender.send(event).is_err() {
            tracing::debug!("No event subscribers connected");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<DomainEvent>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<DomainEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn publish(&self, event: DomainEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, ShortAction, ShortStatus};
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();
        let event = DomainEvent {
            kind: EventKind::ShortRetained,
            short_id: Uuid::new_v4(),
            action: ShortAction::Retain,
            old_status: ShortStatus::Rolled,
            new_status: ShortStatus::Retained,
            user_ids: vec![Uuid::new_v4()],
            occurred_at: Utc::now(),
        };

        notifier.publish(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }
}

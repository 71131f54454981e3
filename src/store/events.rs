//! Commit notifications for the smiley store.
//!
//! Each store instance owns its own event channel — there is no
//! process-wide notification registry. Subscribers get a typed
//! [`CommitEvent`] per commit that inserted records; dropping the
//! receiver unsubscribes.

use tokio::sync::broadcast;

use super::types::SmileyRecord;

/// Events that can lag behind before a slow subscriber starts losing them.
const EVENT_BUFFER: usize = 64;

/// A finished commit that inserted new records.
///
/// Carries exactly the records fresh to that commit; updates to existing
/// records (e.g. an image-data write) do not produce an event.
#[derive(Debug, Clone)]
pub struct CommitEvent {
    pub inserted: Vec<SmileyRecord>,
}

/// Event channel owned by a store instance.
pub(crate) struct StoreEvents {
    sender: broadcast::Sender<CommitEvent>,
}

impl StoreEvents {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }

    /// Subscribe to future commits. Events published before this call are
    /// not delivered.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<CommitEvent> {
        self.sender.subscribe()
    }

    /// Publish a commit's inserted set. A send error only means there are
    /// no live subscribers, which is fine.
    pub(crate) fn publish(&self, inserted: Vec<SmileyRecord>) {
        if inserted.is_empty() {
            return;
        }
        let _ = self.sender.send(CommitEvent { inserted });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_insertions() {
        let events = StoreEvents::new();
        let mut rx = events.subscribe();

        events.publish(vec![SmileyRecord::new(":v:", "http://x/v.gif")]);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.inserted.len(), 1);
        assert_eq!(event.inserted[0].text, ":v:");
    }

    #[tokio::test]
    async fn empty_insertions_produce_no_event() {
        let events = StoreEvents::new();
        let mut rx = events.subscribe();

        events.publish(Vec::new());

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let events = StoreEvents::new();

        // Published with no subscribers — dropped on the floor.
        events.publish(vec![SmileyRecord::new(":a:", "http://x/a.gif")]);

        let mut rx = events.subscribe();
        events.publish(vec![SmileyRecord::new(":b:", "http://x/b.gif")]);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.inserted[0].text, ":b:");
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}

//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DeskEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the desk and whatever
//! renders or records its state.

use chrono::{DateTime, Utc};
use replydesk_core::card::CardState;
use replydesk_core::progress::BulkKind;
use replydesk_core::stats::StatsDelta;
use replydesk_core::types::CommentId;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// DeskEvent
// ---------------------------------------------------------------------------

/// Something the desk confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEventKind {
    /// A confirmed mutation changed the counters.
    StatsChanged { delta: StatsDelta },
    /// A card moved between visible states.
    CardTransitioned {
        comment_id: CommentId,
        from: CardState,
        to: CardState,
    },
    /// A comment or reply was deleted on the server and removed locally.
    CommentRemoved { comment_id: CommentId },
    /// A bulk run finished.
    BulkFinished {
        kind: BulkKind,
        succeeded: usize,
        failed: usize,
    },
}

/// A desk event with its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeskEvent {
    #[serde(flatten)]
    pub kind: DeskEventKind,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DeskEvent {
    pub fn new(kind: DeskEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn stats_changed(delta: StatsDelta) -> Self {
        Self::new(DeskEventKind::StatsChanged { delta })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use replydesk_core::stats::StatsDelta;
/// use replydesk_events::bus::{DeskEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DeskEvent::stats_changed(StatsDelta::FIRST_REPLY));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DeskEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: DeskEvent) {
        // Zero receivers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(DeskEvent::new(DeskEventKind::CardTransitioned {
            comment_id: "c1".into(),
            from: CardState::Unreplied,
            to: CardState::Pending,
        }));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(
            received.kind,
            DeskEventKind::CardTransitioned {
                comment_id: "c1".into(),
                from: CardState::Unreplied,
                to: CardState::Pending,
            }
        );
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(DeskEvent::stats_changed(StatsDelta::MARKED_PENDING));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.kind, e2.kind);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DeskEvent::stats_changed(StatsDelta::NONE));
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = DeskEvent::new(DeskEventKind::BulkFinished {
            kind: BulkKind::Generate,
            succeeded: 2,
            failed: 1,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "bulk_finished");
        assert_eq!(json["kind"], "generate");
        assert_eq!(json["succeeded"], 2);
        assert!(json["timestamp"].is_string());
    }
}

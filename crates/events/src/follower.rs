//! Drives an extra stats widget from the event stream.
//!
//! [`StatsFollower`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and applies every [`DeskEventKind::StatsChanged`] delta to its
//! reconciler, so a second widget variant (e.g. the rate widget) stays in
//! step with the one the desk patches directly. It runs as a background
//! task and shuts down when the bus is dropped.

use replydesk_core::stats::StatsReconciler;
use tokio::sync::broadcast;

use crate::bus::{DeskEvent, DeskEventKind};

/// Background service that mirrors stats deltas onto a widget.
pub struct StatsFollower;

impl StatsFollower {
    /// Run the follow loop until the channel closes.
    ///
    /// Returns the number of deltas applied.
    pub async fn run(
        reconciler: StatsReconciler,
        mut receiver: broadcast::Receiver<DeskEvent>,
    ) -> usize {
        let mut applied = 0;
        loop {
            match receiver.recv().await {
                Ok(DeskEvent {
                    kind: DeskEventKind::StatsChanged { delta },
                    ..
                }) => {
                    reconciler.apply(delta);
                    applied += 1;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::error!(
                        skipped = n,
                        "Stats follower lagged, widget no longer matches the counters"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!(applied, "Event bus closed, stats follower shutting down");
                    break;
                }
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use replydesk_core::card::CardState;
    use replydesk_core::stats::{RateWidget, StatsDelta};

    use super::*;
    use crate::bus::EventBus;

    #[tokio::test]
    async fn follower_applies_only_stats_events() {
        let widget = Arc::new(Mutex::new(RateWidget::new(10, 5)));
        let bus = EventBus::default();
        let handle = tokio::spawn(StatsFollower::run(
            StatsReconciler::new(widget.clone()),
            bus.subscribe(),
        ));

        bus.publish(DeskEvent::new(DeskEventKind::CardTransitioned {
            comment_id: "c1".into(),
            from: CardState::ReadyToPost,
            to: CardState::Replied,
        }));
        bus.publish(DeskEvent::stats_changed(StatsDelta::FIRST_REPLY));
        drop(bus);

        let applied = handle.await.unwrap();
        assert_eq!(applied, 1);

        let w = widget.lock().unwrap();
        assert_eq!(w.unreplied(), 9);
        assert_eq!(w.replied(), 6);
        assert_eq!(w.rate_label(), "60%");
    }

    #[tokio::test]
    async fn follower_stops_when_bus_dropped() {
        let bus = EventBus::default();
        let rx = bus.subscribe();
        drop(bus);

        let applied = StatsFollower::run(StatsReconciler::detached(), rx).await;
        assert_eq!(applied, 0);
    }
}

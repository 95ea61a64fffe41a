//! Single-worker serial queue for bulk operations.
//!
//! [`SerialQueue`] takes a fixed list of work items and processes them one
//! at a time: the next item starts only after the previous one has settled
//! and the configured delay has elapsed. There is no delay after the last
//! item and no way to abort a run once started.

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use replydesk_core::progress::ProgressState;

/// Inter-item delays for the two bulk operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkConfig {
    /// Delay between bulk draft generations.
    pub generate_delay: Duration,
    /// Delay between bulk pending marks.
    pub pending_delay: Duration,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            generate_delay: Duration::from_millis(500),
            pending_delay: Duration::from_millis(200),
        }
    }
}

/// Serial processor over a fixed list of items.
pub struct SerialQueue<T> {
    items: VecDeque<T>,
    delay: Duration,
}

impl<T> SerialQueue<T> {
    pub fn new(items: Vec<T>, delay: Duration) -> Self {
        Self {
            items: items.into(),
            delay,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Process every item with `work`, reporting after each one.
    ///
    /// A failed item is counted; the run continues with the next item.
    /// `on_progress` is called exactly once per item.
    pub async fn run<F, Fut, E, P>(mut self, mut work: F, mut on_progress: P) -> ProgressState
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
        P: FnMut(&ProgressState),
    {
        let mut progress = ProgressState::new(self.items.len());

        while let Some(item) = self.items.pop_front() {
            let outcome = work(item).await;
            if let Err(e) = &outcome {
                tracing::debug!(
                    item = progress.completed() + 1,
                    total = progress.total(),
                    error = %e,
                    "Bulk item failed",
                );
            }
            if let Err(e) = progress.record(outcome.is_ok()) {
                tracing::error!(error = %e, "Bulk progress out of step with queue");
                break;
            }
            on_progress(&progress);

            if !self.items.is_empty() {
                tokio::time::sleep(self.delay).await;
            }
        }

        progress
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn default_delays() {
        let config = BulkConfig::default();
        assert_eq!(config.generate_delay, Duration::from_millis(500));
        assert_eq!(config.pending_delay, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn items_run_serially_with_spacing() {
        let started: Arc<Mutex<Vec<Instant>>> = Arc::default();
        let queue = SerialQueue::new(vec![1, 2, 3], Duration::from_millis(500));

        let log = started.clone();
        let progress = queue
            .run(
                move |_item: i32| {
                    let log = log.clone();
                    async move {
                        log.lock().unwrap().push(Instant::now());
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok::<(), String>(())
                    }
                },
                |_| {},
            )
            .await;

        assert_eq!(progress.completed(), 3);
        let started = started.lock().unwrap();
        for pair in started.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_after_last_item() {
        let begin = Instant::now();
        let queue = SerialQueue::new(vec!["only"], Duration::from_secs(10));

        queue
            .run(|_| async { Ok::<(), String>(()) }, |_| {})
            .await;

        assert!(begin.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_counted_and_run_continues() {
        let mut snapshots = Vec::new();
        let queue = SerialQueue::new(vec![true, false, true], Duration::from_millis(200));

        let progress = queue
            .run(
                |ok| async move {
                    if ok {
                        Ok(())
                    } else {
                        Err("boom".to_string())
                    }
                },
                |p| snapshots.push(p.completed()),
            )
            .await;

        assert_eq!(snapshots, [1, 2, 3]);
        assert_eq!(progress.succeeded(), 2);
        assert_eq!(progress.failed(), 1);
    }

    #[tokio::test]
    async fn empty_queue_finishes_immediately() {
        let queue: SerialQueue<u8> = SerialQueue::new(Vec::new(), Duration::from_secs(1));
        assert!(queue.is_empty());
        let progress = queue.run(|_| async { Ok::<(), String>(()) }, |_| {}).await;
        assert!(progress.is_finished());
        assert_eq!(progress.total(), 0);
    }
}

//! Bulk operation kinds and progress accounting.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The two batched operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkKind {
    Generate,
    MarkPending,
}

impl BulkKind {
    /// Title of the progress indicator.
    pub fn title(self) -> &'static str {
        match self {
            Self::Generate => "Generating replies",
            Self::MarkPending => "Marking as pending",
        }
    }

    /// Confirmation prompt shown before the run starts.
    pub fn confirm_message(self, count: usize) -> String {
        match self {
            Self::Generate => format!("Generate replies for {count} comment(s)?"),
            Self::MarkPending => format!("Mark {count} comment(s) as pending?"),
        }
    }

    /// Final tally shown once the run is over.
    pub fn summary_message(self, progress: &ProgressState) -> String {
        let what = match self {
            Self::Generate => "Bulk reply generation finished.",
            Self::MarkPending => "Bulk mark as pending finished.",
        };
        format!(
            "{what}\nSucceeded: {}\nFailed: {}",
            progress.succeeded(),
            progress.failed()
        )
    }
}

/// Running tally of a bulk operation.
///
/// `succeeded + failed == completed <= total` holds after every
/// [`record`](Self::record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    total: usize,
    completed: usize,
    succeeded: usize,
    failed: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.total
    }

    /// Count one finished item.
    pub fn record(&mut self, succeeded: bool) -> Result<(), CoreError> {
        if self.is_finished() {
            return Err(CoreError::Conflict(format!(
                "all {} items already recorded",
                self.total
            )));
        }
        self.completed += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        Ok(())
    }

    /// Width of the progress bar, `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn label(&self) -> String {
        format!(
            "{} / {} completed (success: {}, failed: {})",
            self.completed, self.total, self.succeeded, self.failed
        )
    }
}

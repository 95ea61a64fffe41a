//! Operator-facing capabilities the desk reports through.

use replydesk_core::progress::{BulkKind, ProgressState};

/// Blocking notifications and confirmation prompts.
pub trait Notifier: Send + Sync {
    /// Show a message the operator must acknowledge.
    fn alert(&self, message: &str);

    /// Ask a yes/no question; `true` means proceed.
    fn confirm(&self, message: &str) -> bool;
}

/// Progress indicator for bulk runs.
pub trait ProgressView: Send + Sync {
    fn open(&self, kind: BulkKind, total: usize);

    /// Called once after every item, whatever its outcome.
    fn update(&self, progress: &ProgressState);

    fn close(&self);
}

/// Progress view that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressView for NoProgress {
    fn open(&self, _kind: BulkKind, _total: usize) {}

    fn update(&self, _progress: &ProgressState) {}

    fn close(&self) {}
}

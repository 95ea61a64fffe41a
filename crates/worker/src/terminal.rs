//! Terminal renditions of the operator-facing capabilities.

use std::io::{self, BufRead, Write};

use replydesk_core::progress::{BulkKind, ProgressState};
use replydesk_desk::notify::{Notifier, ProgressView};

/// Alerts go to stderr; confirmations read a `y`/`yes` line from stdin.
pub struct TerminalNotifier {
    assume_yes: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

/// `y` or `yes`, any case. Everything else declines.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            tracing::debug!(prompt = message, "Confirmation assumed");
            return true;
        }

        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read confirmation, declining");
                false
            }
        }
    }
}

/// Progress reported through the log.
pub struct LogProgress;

impl ProgressView for LogProgress {
    fn open(&self, kind: BulkKind, total: usize) {
        tracing::info!(title = kind.title(), total, "Progress opened");
    }

    fn update(&self, progress: &ProgressState) {
        tracing::info!(
            percent = progress.percent().round() as u64,
            "{}",
            progress.label()
        );
    }

    fn close(&self) {
        tracing::debug!("Progress closed");
    }
}

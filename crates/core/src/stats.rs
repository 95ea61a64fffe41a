//! Dashboard stats: signed deltas, the clamped snapshot, and the widget
//! reconciler.
//!
//! Every confirmed mutation produces exactly one [`StatsDelta`]. The
//! [`StatsSnapshot`] is the model-side mirror of the server counts; the
//! [`StatsReconciler`] patches whatever [`WidgetView`] is rendering them.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Counters and deltas
// ---------------------------------------------------------------------------

/// One of the three dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Unreplied,
    Pending,
    Replied,
}

impl Counter {
    pub const ALL: [Counter; 3] = [Counter::Unreplied, Counter::Pending, Counter::Replied];
}

/// Signed change to the three counters caused by one status transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsDelta {
    pub unreplied: i64,
    pub pending: i64,
    pub replied: i64,
}

impl StatsDelta {
    pub const NONE: Self = Self::new(0, 0, 0);
    /// Unreplied -> Replied (first own reply posted).
    pub const FIRST_REPLY: Self = Self::new(-1, 0, 1);
    /// Pending -> Replied (own reply posted to a marked comment).
    pub const PENDING_REPLIED: Self = Self::new(0, -1, 1);
    /// Unreplied -> Pending.
    pub const MARKED_PENDING: Self = Self::new(-1, 1, 0);
    /// Pending -> Unreplied.
    pub const UNMARKED_PENDING: Self = Self::new(1, -1, 0);
    /// Replied -> Unreplied (last own reply deleted).
    pub const LAST_REPLY_DELETED: Self = Self::new(1, 0, -1);

    pub const fn new(unreplied: i64, pending: i64, replied: i64) -> Self {
        Self {
            unreplied,
            pending,
            replied,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Self::NONE
    }

    pub fn get(self, counter: Counter) -> i64 {
        match counter {
            Counter::Unreplied => self.unreplied,
            Counter::Pending => self.pending,
            Counter::Replied => self.replied,
        }
    }
}

/// Add a signed delta to a counter, clamping at zero.
pub fn clamp_add(current: u64, delta: i64) -> u64 {
    let next = i128::from(current) + i128::from(delta);
    u64::try_from(next.max(0)).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Counter values mirrored from the server at page load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub unreplied: u64,
    pub pending: u64,
    pub replied: u64,
}

impl StatsSnapshot {
    pub fn new(unreplied: u64, pending: u64, replied: u64) -> Self {
        Self {
            unreplied,
            pending,
            replied,
        }
    }

    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Unreplied => self.unreplied,
            Counter::Pending => self.pending,
            Counter::Replied => self.replied,
        }
    }

    /// Apply a delta, clamping each counter at zero independently.
    pub fn apply(&mut self, delta: StatsDelta) {
        self.unreplied = clamp_add(self.unreplied, delta.unreplied);
        self.pending = clamp_add(self.pending, delta.pending);
        self.replied = clamp_add(self.replied, delta.replied);
    }
}

// ---------------------------------------------------------------------------
// Widget views
// ---------------------------------------------------------------------------

/// Rendering of the stats counters that the reconciler patches.
pub trait WidgetView: Send {
    /// Text currently displayed for `counter`, or `None` when the widget
    /// has no element for it.
    fn displayed(&self, counter: Counter) -> Option<String>;

    /// Write a new value for `counter`.
    fn display(&mut self, counter: Counter, value: u64);
}

/// Shared handle to a widget, held by both its owner and a reconciler.
pub type SharedWidget = Arc<Mutex<dyn WidgetView>>;

/// Parse the leading integer of displayed text (`"12 comments"` -> 12).
///
/// Returns `None` when the text does not start with a number.
pub fn parse_displayed(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Compute the next displayed value from the current text and a delta.
///
/// Non-numeric text yields `None` (leave the counter untouched).
pub fn reconcile_text(current: &str, delta: i64) -> Option<u64> {
    let value = parse_displayed(current)?;
    Some(u64::try_from(value.saturating_add(delta).max(0)).unwrap_or(0))
}

/// Plain three-counter widget.
///
/// Each counter is the raw text of its element; a `None` slot models an
/// element that is missing from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterWidget {
    unreplied: Option<String>,
    pending: Option<String>,
    replied: Option<String>,
}

impl CounterWidget {
    pub fn new(
        unreplied: Option<String>,
        pending: Option<String>,
        replied: Option<String>,
    ) -> Self {
        Self {
            unreplied,
            pending,
            replied,
        }
    }

    pub fn from_snapshot(stats: &StatsSnapshot) -> Self {
        Self::new(
            Some(stats.unreplied.to_string()),
            Some(stats.pending.to_string()),
            Some(stats.replied.to_string()),
        )
    }

    pub fn text(&self, counter: Counter) -> Option<&str> {
        self.slot(counter).as_deref()
    }

    fn slot(&self, counter: Counter) -> &Option<String> {
        match counter {
            Counter::Unreplied => &self.unreplied,
            Counter::Pending => &self.pending,
            Counter::Replied => &self.replied,
        }
    }
}

impl WidgetView for CounterWidget {
    fn displayed(&self, counter: Counter) -> Option<String> {
        self.slot(counter).clone()
    }

    fn display(&mut self, counter: Counter, value: u64) {
        let slot = match counter {
            Counter::Unreplied => &mut self.unreplied,
            Counter::Pending => &mut self.pending,
            Counter::Replied => &mut self.replied,
        };
        if slot.is_some() {
            *slot = Some(value.to_string());
        }
    }
}

/// Percentage of comments still waiting for a reply.
///
/// `100 - floor(100 * replied / (unreplied + replied))`, or 0 when there
/// are no comments at all.
pub fn unreplied_rate(unreplied: u64, replied: u64) -> u64 {
    let total = u128::from(unreplied) + u128::from(replied);
    if total == 0 {
        return 0;
    }
    let replied_pct = (100 * u128::from(replied)) / total;
    100 - u64::try_from(replied_pct).unwrap_or(100)
}

/// Rate-percentage widget: keeps raw unreplied/replied counts and shows the
/// derived unreplied rate. It has no pending element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWidget {
    unreplied: u64,
    replied: u64,
    rate_label: String,
}

impl RateWidget {
    pub fn new(unreplied: u64, replied: u64) -> Self {
        Self {
            unreplied,
            replied,
            rate_label: format_rate(unreplied, replied),
        }
    }

    pub fn from_snapshot(stats: &StatsSnapshot) -> Self {
        Self::new(stats.unreplied, stats.replied)
    }

    pub fn unreplied(&self) -> u64 {
        self.unreplied
    }

    pub fn replied(&self) -> u64 {
        self.replied
    }

    pub fn rate(&self) -> u64 {
        unreplied_rate(self.unreplied, self.replied)
    }

    /// Displayed rate text, e.g. `"60%"`.
    pub fn rate_label(&self) -> &str {
        &self.rate_label
    }
}

fn format_rate(unreplied: u64, replied: u64) -> String {
    format!("{}%", unreplied_rate(unreplied, replied))
}

impl WidgetView for RateWidget {
    fn displayed(&self, counter: Counter) -> Option<String> {
        match counter {
            Counter::Unreplied => Some(self.unreplied.to_string()),
            Counter::Replied => Some(self.replied.to_string()),
            Counter::Pending => None,
        }
    }

    fn display(&mut self, counter: Counter, value: u64) {
        match counter {
            Counter::Unreplied => self.unreplied = value,
            Counter::Replied => self.replied = value,
            Counter::Pending => return,
        }
        self.rate_label = format_rate(self.unreplied, self.replied);
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Applies deltas to a widget handed in at construction time.
///
/// A reconciler without a widget (the page has no stats widget) accepts
/// every delta as a no-op.
#[derive(Clone, Default)]
pub struct StatsReconciler {
    widget: Option<SharedWidget>,
}

impl StatsReconciler {
    pub fn new(widget: SharedWidget) -> Self {
        Self {
            widget: Some(widget),
        }
    }

    /// A reconciler for a page without a stats widget.
    pub fn detached() -> Self {
        Self { widget: None }
    }

    pub fn is_attached(&self) -> bool {
        self.widget.is_some()
    }

    /// Patch each counter with `max(0, displayed + delta)`.
    ///
    /// Counters whose element is missing or whose text is not numeric are
    /// skipped; the others are still updated.
    pub fn apply(&self, delta: StatsDelta) {
        let Some(widget) = &self.widget else {
            return;
        };
        let mut widget = widget.lock().unwrap_or_else(PoisonError::into_inner);
        for counter in Counter::ALL {
            let Some(text) = widget.displayed(counter) else {
                continue;
            };
            if let Some(value) = reconcile_text(&text, delta.get(counter)) {
                widget.display(counter, value);
            }
        }
    }
}

impl std::fmt::Debug for StatsReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsReconciler")
            .field("attached", &self.is_attached())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

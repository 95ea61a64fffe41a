//! Per-comment card state machine.
//!
//! A [`CommentCard`] is the view model of one top-level comment: its reply
//! thread, the draft/post composer, and the controls the operator clicks.
//! Every mutation is split into a `begin_*` step (validates the transition
//! and disables the control for the duration of the request) and a
//! completion step (`*_succeeded` / `*_failed`) that applies the confirmed
//! outcome or restores the control.
//!
//! | From              | Trigger          | To          | Delta (u, p, r) |
//! |-------------------|------------------|-------------|-----------------|
//! | Unreplied/Pending | draft requested  | Drafting    | none            |
//! | Drafting          | draft succeeded  | ReadyToPost | none            |
//! | Drafting          | draft failed     | prior       | none            |
//! | ReadyToPost       | post succeeded   | Replied     | (-1, 0, +1) from Unreplied, (0, -1, +1) from Pending, none from Replied |
//! | Unreplied         | marked pending   | Pending     | (-1, +1, 0)     |
//! | Pending           | unmarked         | Unreplied   | (+1, -1, 0)     |
//! | Replied           | last own reply deleted | Unreplied | (+1, 0, -1) |

use serde::Serialize;

use crate::comment::{classify, Comment, CommentStatus, Reply};
use crate::error::CoreError;
use crate::stats::StatsDelta;
use crate::types::{CommentId, Rating};

pub const GENERATE_LABEL: &str = "Generate reply";
pub const GENERATING_LABEL: &str = "Generating...";
pub const REGENERATE_LABEL: &str = "Regenerate";
pub const POST_LABEL: &str = "Post reply";
pub const POSTING_LABEL: &str = "Posting...";

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// A clickable control on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub label: String,
    pub visible: bool,
    pub enabled: bool,
}

impl Control {
    fn shown(label: &str) -> Self {
        Self {
            label: label.to_string(),
            visible: true,
            enabled: true,
        }
    }

    fn hidden(label: &str) -> Self {
        Self {
            visible: false,
            ..Self::shown(label)
        }
    }

    fn reset(&mut self, label: &str, visible: bool) {
        self.label = label.to_string();
        self.visible = visible;
        self.enabled = true;
    }
}

/// Which pending affordance the card currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingToggle {
    /// "Mark as pending" (card is unreplied).
    Mark,
    /// "Undo pending" (card is pending).
    Unmark,
    /// No pending affordance (card is replied).
    Hidden,
}

impl PendingToggle {
    fn for_status(status: CommentStatus) -> Self {
        match status {
            CommentStatus::Unreplied => Self::Mark,
            CommentStatus::Pending => Self::Unmark,
            CommentStatus::Replied => Self::Hidden,
        }
    }
}

/// Visible state of a card, combining the reply status with the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    Unreplied,
    Drafting,
    ReadyToPost,
    Replied,
    Pending,
}

impl CardState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unreplied => "unreplied",
            Self::Drafting => "drafting",
            Self::ReadyToPost => "ready to post",
            Self::Replied => "replied",
            Self::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Drafting { was_ready: bool },
    Ready,
}

// ---------------------------------------------------------------------------
// Requests handed to the remote client
// ---------------------------------------------------------------------------

/// Inputs for a draft request, captured when the draft starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub comment_id: CommentId,
    pub video_id: String,
    pub comment_text: String,
}

/// Inputs for a post request, captured when the post starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub parent_id: CommentId,
    pub reply_text: String,
    pub original_comment: String,
    pub ai_suggestion: String,
    pub video_id: String,
}

/// Result of a confirmed post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostOutcome {
    pub delta: StatsDelta,
    /// The card was not replied before this post.
    pub first_reply: bool,
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// View model of one top-level comment card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCard {
    id: CommentId,
    video_id: String,
    text: String,
    is_replied: bool,
    is_pending: bool,
    phase: Phase,
    thread: Vec<Reply>,

    generate: Control,
    regenerate: Control,
    post: Control,
    composer_visible: bool,
    reply_text: String,
    ai_suggestion: String,
    suggestions: Vec<String>,
    suggestions_visible: bool,
    pending_toggle: PendingToggle,
    pending_toggle_enabled: bool,
    rating: Rating,
    rating_enabled: bool,
    /// Label of the draft trigger before it switched to the spinner label.
    saved_trigger_label: Option<String>,
}

impl CommentCard {
    pub fn from_comment(comment: Comment) -> Self {
        let status = comment.status();
        Self {
            is_replied: status == CommentStatus::Replied,
            is_pending: comment.marked_pending,
            phase: Phase::Idle,
            thread: comment.replies,
            generate: Control::shown(GENERATE_LABEL),
            regenerate: Control::hidden(REGENERATE_LABEL),
            post: Control::hidden(POST_LABEL),
            composer_visible: false,
            reply_text: String::new(),
            ai_suggestion: String::new(),
            suggestions: Vec::new(),
            suggestions_visible: false,
            pending_toggle: PendingToggle::for_status(status),
            pending_toggle_enabled: true,
            rating: Rating::None,
            rating_enabled: true,
            saved_trigger_label: None,
            id: comment.id,
            video_id: comment.video_id,
            text: comment.text,
        }
    }

    // ---- accessors ----

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the next post counts as a re-reply (no stats change).
    pub fn is_replied(&self) -> bool {
        self.is_replied
    }

    pub fn status(&self) -> CommentStatus {
        if self.is_replied {
            CommentStatus::Replied
        } else if self.is_pending {
            CommentStatus::Pending
        } else {
            CommentStatus::Unreplied
        }
    }

    pub fn state(&self) -> CardState {
        match self.phase {
            Phase::Drafting { .. } => CardState::Drafting,
            Phase::Ready => CardState::ReadyToPost,
            Phase::Idle => match self.status() {
                CommentStatus::Unreplied => CardState::Unreplied,
                CommentStatus::Pending => CardState::Pending,
                CommentStatus::Replied => CardState::Replied,
            },
        }
    }

    /// Card carries the "replied" visual class.
    pub fn has_replied_class(&self) -> bool {
        self.is_replied
    }

    /// Card carries the "pending" visual class.
    pub fn has_pending_class(&self) -> bool {
        self.is_pending && !self.is_replied
    }

    pub fn thread(&self) -> &[Reply] {
        &self.thread
    }

    pub fn generate_control(&self) -> &Control {
        &self.generate
    }

    pub fn regenerate_control(&self) -> &Control {
        &self.regenerate
    }

    pub fn post_control(&self) -> &Control {
        &self.post
    }

    pub fn composer_visible(&self) -> bool {
        self.composer_visible
    }

    pub fn reply_text(&self) -> &str {
        &self.reply_text
    }

    pub fn ai_suggestion(&self) -> &str {
        &self.ai_suggestion
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestions_visible(&self) -> bool {
        self.suggestions_visible
    }

    pub fn pending_toggle(&self) -> PendingToggle {
        self.pending_toggle
    }

    pub fn pending_toggle_enabled(&self) -> bool {
        self.pending_toggle_enabled
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn rating_enabled(&self) -> bool {
        self.rating_enabled
    }

    fn invalid(&self, action: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            action,
            state: self.state().label(),
        }
    }

    fn busy(&self, what: &str) -> CoreError {
        CoreError::Conflict(format!("{what} already in flight for comment {}", self.id))
    }

    // ---- drafting ----

    fn draft_trigger(&mut self) -> &mut Control {
        if self.regenerate.visible {
            &mut self.regenerate
        } else {
            &mut self.generate
        }
    }

    /// Start a draft: disable the active trigger and show the spinner label.
    pub fn begin_draft(&mut self) -> Result<DraftRequest, CoreError> {
        if matches!(self.phase, Phase::Drafting { .. }) {
            return Err(self.busy("draft"));
        }
        if !self.post.enabled {
            return Err(self.busy("post"));
        }
        let was_ready = self.phase == Phase::Ready;
        let trigger = self.draft_trigger();
        if !trigger.enabled {
            return Err(self.busy("draft"));
        }
        trigger.enabled = false;
        let saved = std::mem::replace(&mut trigger.label, GENERATING_LABEL.to_string());
        self.saved_trigger_label = Some(saved);
        self.phase = Phase::Drafting { was_ready };

        Ok(DraftRequest {
            comment_id: self.id.clone(),
            video_id: self.video_id.clone(),
            comment_text: self.text.clone(),
        })
    }

    /// Populate the suggestion chips and open the composer.
    ///
    /// The first suggestion is preselected as the AI suggestion of record.
    pub fn draft_succeeded(&mut self, suggestions: Vec<String>) -> Result<(), CoreError> {
        if !matches!(self.phase, Phase::Drafting { .. }) {
            return Err(self.invalid("accept a draft"));
        }
        if let Some(first) = suggestions.first() {
            self.ai_suggestion = first.clone();
        }
        self.suggestions = suggestions;
        self.suggestions_visible = true;
        self.composer_visible = true;
        self.post.visible = true;
        self.generate.reset(GENERATE_LABEL, false);
        self.regenerate.reset(REGENERATE_LABEL, true);
        self.saved_trigger_label = None;
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Restore the trigger that started the draft and return to the prior
    /// state. Has no effect when no draft is in flight.
    pub fn draft_failed(&mut self) {
        let Phase::Drafting { was_ready } = self.phase else {
            return;
        };
        let label = self
            .saved_trigger_label
            .take()
            .unwrap_or_else(|| GENERATE_LABEL.to_string());
        let trigger = self.draft_trigger();
        trigger.enabled = true;
        trigger.label = label;
        self.phase = if was_ready { Phase::Ready } else { Phase::Idle };
    }

    // ---- composer ----

    /// Choose a suggestion chip: it becomes both the reply text and the AI
    /// suggestion of record.
    pub fn select_suggestion(&mut self, text: &str) {
        self.reply_text = text.to_string();
        self.ai_suggestion = text.to_string();
    }

    pub fn edit_reply(&mut self, text: &str) {
        self.reply_text = text.to_string();
    }

    // ---- posting ----

    /// Start a post. Returns `Ok(None)` when the reply text is empty.
    pub fn begin_post(&mut self) -> Result<Option<PostRequest>, CoreError> {
        if !self.composer_visible || matches!(self.phase, Phase::Drafting { .. }) {
            return Err(self.invalid("post a reply"));
        }
        if !self.post.enabled {
            return Err(self.busy("post"));
        }
        if self.reply_text.is_empty() {
            return Ok(None);
        }
        self.post.enabled = false;
        self.post.label = POSTING_LABEL.to_string();

        Ok(Some(PostRequest {
            parent_id: self.id.clone(),
            reply_text: self.reply_text.clone(),
            original_comment: self.text.clone(),
            ai_suggestion: self.ai_suggestion.clone(),
            video_id: self.video_id.clone(),
        }))
    }

    /// Append the confirmed reply and reset the composer.
    ///
    /// The delta depends on the explicit `is_replied` flag: only the first
    /// own reply moves the card out of unreplied or pending.
    pub fn post_succeeded(&mut self, reply: Reply) -> Result<PostOutcome, CoreError> {
        if self.post.enabled {
            return Err(self.invalid("confirm a post"));
        }
        let delta = match self.status() {
            CommentStatus::Replied => StatsDelta::NONE,
            CommentStatus::Pending => StatsDelta::PENDING_REPLIED,
            CommentStatus::Unreplied => StatsDelta::FIRST_REPLY,
        };
        let first_reply = !self.is_replied;

        self.thread.push(reply);
        self.is_replied = true;
        self.is_pending = false;
        self.pending_toggle = PendingToggle::Hidden;
        self.pending_toggle_enabled = true;

        self.reply_text.clear();
        self.suggestions_visible = false;
        self.generate.reset(GENERATE_LABEL, true);
        self.regenerate.reset(REGENERATE_LABEL, false);
        self.post.reset(POST_LABEL, true);
        self.phase = Phase::Idle;

        Ok(PostOutcome { delta, first_reply })
    }

    pub fn post_failed(&mut self) {
        self.post.enabled = true;
        self.post.label = POST_LABEL.to_string();
    }

    // ---- pending ----

    pub fn begin_mark_pending(&mut self) -> Result<(), CoreError> {
        self.begin_pending_toggle(PendingToggle::Mark, "mark as pending")
    }

    pub fn begin_unmark_pending(&mut self) -> Result<(), CoreError> {
        self.begin_pending_toggle(PendingToggle::Unmark, "undo pending")
    }

    fn begin_pending_toggle(
        &mut self,
        expected: PendingToggle,
        action: &'static str,
    ) -> Result<(), CoreError> {
        if self.pending_toggle != expected {
            return Err(self.invalid(action));
        }
        if !self.pending_toggle_enabled {
            return Err(self.busy("pending change"));
        }
        self.pending_toggle_enabled = false;
        Ok(())
    }

    /// Confirmed Unreplied -> Pending.
    pub fn pending_marked(&mut self) -> Result<StatsDelta, CoreError> {
        if self.pending_toggle != PendingToggle::Mark || self.pending_toggle_enabled {
            return Err(self.invalid("confirm pending"));
        }
        self.is_pending = true;
        self.pending_toggle = PendingToggle::Unmark;
        self.pending_toggle_enabled = true;
        Ok(StatsDelta::MARKED_PENDING)
    }

    /// Confirmed Pending -> Unreplied.
    pub fn pending_unmarked(&mut self) -> Result<StatsDelta, CoreError> {
        if self.pending_toggle != PendingToggle::Unmark || self.pending_toggle_enabled {
            return Err(self.invalid("confirm undo pending"));
        }
        self.is_pending = false;
        self.pending_toggle = PendingToggle::Mark;
        self.pending_toggle_enabled = true;
        Ok(StatsDelta::UNMARKED_PENDING)
    }

    pub fn pending_toggle_failed(&mut self) {
        self.pending_toggle_enabled = true;
    }

    // ---- rating ----

    pub fn begin_rate(&mut self) -> Result<(), CoreError> {
        if !self.rating_enabled {
            return Err(self.busy("rating"));
        }
        self.rating_enabled = false;
        Ok(())
    }

    pub fn rated(&mut self, rating: Rating) {
        self.rating = rating;
        self.rating_enabled = true;
    }

    pub fn rate_failed(&mut self) {
        self.rating_enabled = true;
    }

    // ---- thread ----

    pub fn reply_position(&self, reply_id: &str) -> Option<usize> {
        self.thread.iter().position(|r| r.id == reply_id)
    }

    /// Remove a confirmed-deleted reply from the thread.
    ///
    /// When the last own reply disappears from a replied card, the card
    /// reverts to unreplied: the mark-pending affordance comes back and the
    /// next post counts as a first reply again.
    pub fn remove_reply(&mut self, reply_id: &str) -> Result<StatsDelta, CoreError> {
        let index = self
            .reply_position(reply_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "reply",
                id: reply_id.to_string(),
            })?;
        self.thread.remove(index);

        let still_replied = classify(false, &self.thread) == CommentStatus::Replied;
        if self.is_replied && !still_replied {
            self.is_replied = false;
            self.is_pending = false;
            self.pending_toggle = PendingToggle::Mark;
            self.pending_toggle_enabled = true;
            return Ok(StatsDelta::LAST_REPLY_DELETED);
        }
        Ok(StatsDelta::NONE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

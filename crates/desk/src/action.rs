//! Typed action dispatch.
//!
//! Operator input arrives as a [`CardAction`]: a comment id plus an
//! [`ActionKind`]. [`dispatch`] routes it to the matching handler of a
//! [`CardActions`] implementation.

use async_trait::async_trait;
use replydesk_core::types::CommentId;

/// The mutations an operator can trigger on a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Generate,
    Post,
    Delete,
    MarkPending,
    UnmarkPending,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::MarkPending => "mark_pending",
            Self::UnmarkPending => "unmark_pending",
        }
    }
}

/// One operator click, keyed by comment id and action kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardAction {
    pub comment_id: CommentId,
    pub kind: ActionKind,
}

impl CardAction {
    pub fn new(comment_id: impl Into<CommentId>, kind: ActionKind) -> Self {
        Self {
            comment_id: comment_id.into(),
            kind,
        }
    }
}

/// How an action handler settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The server confirmed the mutation and the board was updated.
    Completed,
    /// Nothing to do: empty reply text, or the operator declined the
    /// confirmation prompt.
    Skipped,
    /// The control was disabled by its own in-flight request.
    Busy,
    /// The action failed; the operator was notified with this message and
    /// the control was restored.
    Failed(String),
}

/// Handlers for each action kind.
#[async_trait]
pub trait CardActions: Send + Sync {
    async fn on_generate(&self, comment_id: &str) -> ActionOutcome;

    async fn on_post(&self, comment_id: &str) -> ActionOutcome;

    async fn on_delete(&self, comment_id: &str) -> ActionOutcome;

    async fn on_mark_pending(&self, comment_id: &str) -> ActionOutcome;

    async fn on_unmark_pending(&self, comment_id: &str) -> ActionOutcome;
}

/// Route an action to its handler.
pub async fn dispatch<H>(handler: &H, action: &CardAction) -> ActionOutcome
where
    H: CardActions + ?Sized,
{
    let id = action.comment_id.as_str();
    match action.kind {
        ActionKind::Generate => handler.on_generate(id).await,
        ActionKind::Post => handler.on_post(id).await,
        ActionKind::Delete => handler.on_delete(id).await,
        ActionKind::MarkPending => handler.on_mark_pending(id).await,
        ActionKind::UnmarkPending => handler.on_unmark_pending(id).await,
    }
}

//! Comments, their reply threads, and status classification.
//!
//! A top-level [`Comment`] carries an ordered thread of [`Reply`] leaves.
//! Its [`CommentStatus`] is never stored independently: it is derived from
//! the thread (own replies) and the explicit pending mark, see [`classify`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::CommentId;

/// Avatar shown for a freshly posted reply when the server sends none.
pub const DEFAULT_AVATAR: &str = "/static/default-avatar.png";

/// Author name shown for a freshly posted reply when the server sends none.
pub const DEFAULT_AUTHOR_NAME: &str = "You";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Reply status of a top-level comment, as counted by the stats widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Unreplied,
    Pending,
    Replied,
}

impl CommentStatus {
    /// Human-readable label for display and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unreplied => "unreplied",
            Self::Pending => "pending",
            Self::Replied => "replied",
        }
    }
}

/// Classify a comment from its pending mark and its thread.
///
/// `replied` wins over `pending`: a marked comment that has an own reply
/// counts as replied.
pub fn classify(marked_pending: bool, replies: &[Reply]) -> CommentStatus {
    if replies.iter().any(|r| r.is_own_reply) {
        CommentStatus::Replied
    } else if marked_pending {
        CommentStatus::Pending
    } else {
        CommentStatus::Unreplied
    }
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A reply inside a comment thread. Replies never have threads of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: CommentId,
    pub text: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_image: String,
    /// Publication date, `YYYY-MM-DD`.
    #[serde(default)]
    pub published_on: String,
    /// Whether the operator's own channel authored this reply.
    #[serde(default)]
    pub is_own_reply: bool,
}

impl Reply {
    /// Build the thread entry for a reply the operator just posted.
    ///
    /// Missing or empty server fields fall back to [`DEFAULT_AUTHOR_NAME`],
    /// [`DEFAULT_AVATAR`], and `today`.
    pub fn posted(
        id: CommentId,
        text: String,
        author_name: Option<String>,
        author_image: Option<String>,
        published_at: Option<String>,
        today: NaiveDate,
    ) -> Self {
        let published_on = published_at
            .filter(|s| !s.is_empty())
            .map(|s| s.chars().take(10).collect())
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        Self {
            id,
            text,
            author_name: non_empty_or(author_name, DEFAULT_AUTHOR_NAME),
            author_image: non_empty_or(author_image, DEFAULT_AVATAR),
            published_on,
            is_own_reply: true,
        }
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A top-level comment as rendered by the server on page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub video_id: String,
    pub text: String,
    /// Explicitly marked for later handling.
    #[serde(default)]
    pub marked_pending: bool,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn status(&self) -> CommentStatus {
        classify(self.marked_pending, &self.replies)
    }
}

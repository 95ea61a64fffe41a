//! Request bodies and response interpretation for the reply server.
//!
//! Every endpoint answers with a JSON object. An explicit
//! `"status": "error"` is an application failure no matter the HTTP status
//! code; anything that cannot be read as the expected success payload is a
//! malformed response.

use replydesk_core::card::{DraftRequest, PostRequest};
use replydesk_core::types::Rating;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ClientError;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /generate_reply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateReplyRequest {
    pub comment_text: String,
    pub video_id: String,
    /// Always serialized, `null` when absent.
    pub custom_instruction: Option<String>,
}

impl From<DraftRequest> for GenerateReplyRequest {
    fn from(draft: DraftRequest) -> Self {
        Self {
            comment_text: draft.comment_text,
            video_id: draft.video_id,
            custom_instruction: None,
        }
    }
}

/// Body of `POST /post_reply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostReplyRequest {
    pub parent_id: String,
    pub reply_text: String,
    pub original_comment: String,
    pub ai_suggestion: String,
    pub video_id: String,
}

impl From<PostRequest> for PostReplyRequest {
    fn from(post: PostRequest) -> Self {
        Self {
            parent_id: post.parent_id,
            reply_text: post.reply_text,
            original_comment: post.original_comment,
            ai_suggestion: post.ai_suggestion,
            video_id: post.video_id,
        }
    }
}

/// Body of the single-comment endpoints (`mark_complete`,
/// `unmark_complete`, `delete_comment`).
#[derive(Debug, Serialize)]
pub struct CommentIdRequest<'a> {
    pub comment_id: &'a str,
}

/// Body of `POST /rate_comment`.
#[derive(Debug, Serialize)]
pub struct RateCommentRequest<'a> {
    pub comment_id: &'a str,
    pub rating: Rating,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Reply created by `POST /post_reply`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostedReply {
    pub id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

fn status_of(value: &Value) -> Option<&str> {
    value.get("status").and_then(Value::as_str)
}

fn message_of(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Fail when the body carries `"status": "error"`.
pub fn reject_error_status(value: &Value) -> Result<(), ClientError> {
    if status_of(value) == Some("error") {
        return Err(ClientError::Application {
            message: message_of(value),
        });
    }
    Ok(())
}

/// Fail unless the body carries `"status": "success"`.
pub fn expect_success(value: &Value) -> Result<(), ClientError> {
    reject_error_status(value)?;
    if status_of(value) == Some("success") {
        Ok(())
    } else {
        Err(ClientError::Application {
            message: message_of(value),
        })
    }
}

/// Extract the ordered, non-empty suggestion list of a draft response.
pub fn parse_suggestions(value: &Value) -> Result<Vec<String>, ClientError> {
    reject_error_status(value)?;
    let malformed = || ClientError::MalformedResponse("missing or invalid suggestions".into());

    let items = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(malformed)?;
    let suggestions = items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(malformed)?;
    if suggestions.is_empty() {
        return Err(malformed());
    }
    Ok(suggestions)
}

/// Extract the created reply of a post response.
pub fn parse_posted_reply(value: &Value) -> Result<PostedReply, ClientError> {
    expect_success(value)?;
    PostedReply::deserialize(value)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid post_reply payload: {e}")))
}

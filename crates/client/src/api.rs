//! HTTP client for the reply server's mutation endpoints.
//!
//! Wraps the five comment mutations (draft generation, posting, pending
//! mark/unmark, deletion) plus rating using [`reqwest`]. Calls are
//! fire-and-settle: no retry and no timeout beyond what the underlying
//! [`reqwest::Client`] enforces.

use async_trait::async_trait;
use replydesk_core::types::Rating;
use serde::Serialize;
use serde_json::Value;

use crate::messages::{
    expect_success, parse_posted_reply, parse_suggestions, reject_error_status, CommentIdRequest,
    GenerateReplyRequest, PostReplyRequest, PostedReply, RateCommentRequest,
};

/// Message used when the server reports a failure without one.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Which side of the boundary a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server answered with an explicit failure status.
    Application,
    /// Network failure, unreadable body, or malformed success payload.
    Transport,
}

/// Errors from the remote mutation client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server reported a failure.
    #[error("{}", .message.as_deref().unwrap_or(UNKNOWN_ERROR))]
    Application {
        /// Human-readable message from the server, if any.
        message: Option<String>,
    },

    /// The body was not JSON or lacked the expected success fields.
    #[error("Invalid response from server: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Application { .. } => ErrorKind::Application,
            Self::Transport(_) | Self::MalformedResponse(_) => ErrorKind::Transport,
        }
    }

    /// Text shown to the operator.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// The mutations the desk can ask the server to perform.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// Ask the server for AI reply suggestions.
    async fn generate_draft(
        &self,
        request: &GenerateReplyRequest,
    ) -> Result<Vec<String>, ClientError>;

    /// Post a reply under `request.parent_id`.
    async fn post_reply(&self, request: &PostReplyRequest) -> Result<PostedReply, ClientError>;

    async fn mark_pending(&self, comment_id: &str) -> Result<(), ClientError>;

    async fn unmark_pending(&self, comment_id: &str) -> Result<(), ClientError>;

    /// Delete a comment or reply. Irreversible once confirmed.
    async fn delete_comment(&self, comment_id: &str) -> Result<(), ClientError>;

    async fn rate_comment(&self, comment_id: &str, rating: Rating) -> Result<(), ClientError>;
}

/// HTTP client for a single reply server.
pub struct ReplyDeskApi {
    client: reqwest::Client,
    base_url: String,
}

impl ReplyDeskApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Server origin, e.g. `http://localhost:5000`.
    pub fn new(base_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (cookie store, proxies, connection pool).
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    /// POST a JSON body and read the JSON answer.
    ///
    /// Error bodies are read regardless of the HTTP status code, since the
    /// server sends `{"status": "error", "message": ...}` with 401/500.
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::MalformedResponse(format!("non-JSON body (HTTP {}): {e}", status.as_u16()))
        })?;

        reject_error_status(&value)?;
        if !status.is_success() {
            return Err(ClientError::Application {
                message: Some(format!("HTTP {}", status.as_u16())),
            });
        }

        tracing::debug!(path, status = status.as_u16(), "Reply server answered");
        Ok(value)
    }

    async fn post_comment_id(&self, path: &str, comment_id: &str) -> Result<(), ClientError> {
        let value = self
            .post_json(path, &CommentIdRequest { comment_id })
            .await?;
        expect_success(&value)
    }
}

#[async_trait]
impl CommentApi for ReplyDeskApi {
    async fn generate_draft(
        &self,
        request: &GenerateReplyRequest,
    ) -> Result<Vec<String>, ClientError> {
        let value = self.post_json("generate_reply", request).await?;
        parse_suggestions(&value)
    }

    async fn post_reply(&self, request: &PostReplyRequest) -> Result<PostedReply, ClientError> {
        let value = self.post_json("post_reply", request).await?;
        parse_posted_reply(&value)
    }

    async fn mark_pending(&self, comment_id: &str) -> Result<(), ClientError> {
        self.post_comment_id("mark_complete", comment_id).await
    }

    async fn unmark_pending(&self, comment_id: &str) -> Result<(), ClientError> {
        self.post_comment_id("unmark_complete", comment_id).await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ClientError> {
        self.post_comment_id("delete_comment", comment_id).await
    }

    async fn rate_comment(&self, comment_id: &str, rating: Rating) -> Result<(), ClientError> {
        let value = self
            .post_json("rate_comment", &RateCommentRequest { comment_id, rating })
            .await?;
        expect_success(&value)
    }
}

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use replydesk_client::api::{ClientError, CommentApi};
use replydesk_client::messages::{GenerateReplyRequest, PostReplyRequest, PostedReply};
use replydesk_core::board::BoardSnapshot;
use replydesk_core::comment::{Comment, Reply};
use replydesk_core::progress::{BulkKind, ProgressState};
use replydesk_core::stats::StatsSnapshot;
use replydesk_core::types::Rating;
use replydesk_desk::desk::Desk;
use replydesk_desk::notify::{Notifier, ProgressView};
use tokio::time::Instant;

/// One recorded server call.
#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: &'static str,
    pub comment_id: String,
    pub at: Instant,
}

/// In-memory stand-in for the moderation server.
///
/// Every call takes `latency` to settle. Ids listed in `failing` get an
/// application error back from every endpoint; ids in `failing_posts` only
/// from `post_reply`.
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    failing: HashSet<String>,
    failing_posts: HashSet<String>,
    latency: Duration,
    next_reply: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            failing_posts: HashSet::new(),
            latency: Duration::from_millis(50),
            next_reply: AtomicUsize::new(1),
        }
    }

    pub fn failing_for(mut self, ids: &[&str]) -> Self {
        self.failing = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn rejecting_posts_for(mut self, ids: &[&str]) -> Self {
        self.failing_posts = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }

    async fn settle(&self, endpoint: &'static str, comment_id: &str) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            comment_id: comment_id.to_string(),
            at: Instant::now(),
        });
        tokio::time::sleep(self.latency).await;
        if self.failing.contains(comment_id) {
            return Err(ClientError::Application {
                message: Some(format!("server rejected {comment_id}")),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CommentApi for FakeApi {
    // Draft requests carry no comment id; fixtures use the comment id as the
    // video id so failures can still be keyed per comment.
    async fn generate_draft(
        &self,
        request: &GenerateReplyRequest,
    ) -> Result<Vec<String>, ClientError> {
        self.settle("generate_reply", &request.video_id).await?;
        Ok(vec![
            format!("Thanks for watching! ({})", request.comment_text),
            "Glad you enjoyed it.".to_string(),
        ])
    }

    async fn post_reply(&self, request: &PostReplyRequest) -> Result<PostedReply, ClientError> {
        self.settle("post_reply", &request.parent_id).await?;
        if self.failing_posts.contains(&request.parent_id) {
            return Err(ClientError::Application { message: None });
        }
        let n = self.next_reply.fetch_add(1, Ordering::SeqCst);
        Ok(PostedReply {
            id: format!("r{n}"),
            author_name: Some("Channel Owner".to_string()),
            author_image: None,
            published_at: Some("2024-05-01T10:00:00Z".to_string()),
        })
    }

    async fn mark_pending(&self, comment_id: &str) -> Result<(), ClientError> {
        self.settle("mark_complete", comment_id).await
    }

    async fn unmark_pending(&self, comment_id: &str) -> Result<(), ClientError> {
        self.settle("unmark_complete", comment_id).await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ClientError> {
        self.settle("delete_comment", comment_id).await
    }

    async fn rate_comment(&self, comment_id: &str, _rating: Rating) -> Result<(), ClientError> {
        self.settle("rate_comment", comment_id).await
    }
}

/// Records alerts and answers confirmations with a fixed choice.
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    answer: bool,
}

impl RecordingNotifier {
    pub fn accepting() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            answer: true,
        }
    }

    pub fn declining() -> Self {
        Self {
            answer: false,
            ..Self::accepting()
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.answer
    }
}

/// What the progress indicator was asked to show.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressCall {
    Open(BulkKind, usize),
    Update(ProgressState),
    Close,
}

#[derive(Default)]
pub struct RecordingProgress {
    calls: Mutex<Vec<ProgressCall>>,
}

impl RecordingProgress {
    pub fn calls(&self) -> Vec<ProgressCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<ProgressState> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProgressCall::Update(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

impl ProgressView for RecordingProgress {
    fn open(&self, kind: BulkKind, total: usize) {
        self.calls.lock().unwrap().push(ProgressCall::Open(kind, total));
    }

    fn update(&self, progress: &ProgressState) {
        self.calls.lock().unwrap().push(ProgressCall::Update(*progress));
    }

    fn close(&self) {
        self.calls.lock().unwrap().push(ProgressCall::Close);
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn comment(id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        video_id: id.to_string(),
        text: format!("comment {id}"),
        marked_pending: false,
        replies: Vec::new(),
    }
}

pub fn own_reply(id: &str) -> Reply {
    Reply {
        id: id.to_string(),
        text: "thanks".to_string(),
        author_name: "You".to_string(),
        author_image: "/static/default-avatar.png".to_string(),
        published_on: "2024-01-01".to_string(),
        is_own_reply: true,
    }
}

pub fn snapshot(comments: Vec<Comment>, stats: StatsSnapshot) -> BoardSnapshot {
    BoardSnapshot { comments, stats }
}

/// A desk over comments A, B and C with (unreplied, pending, replied) =
/// (10, 0, 5).
pub fn abc_desk(
    api: Arc<FakeApi>,
    notifier: Arc<RecordingNotifier>,
) -> Desk {
    Desk::new(
        api,
        notifier,
        snapshot(
            vec![comment("A"), comment("B"), comment("C")],
            StatsSnapshot::new(10, 0, 5),
        ),
    )
}

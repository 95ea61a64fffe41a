//! The moderation desk controller.
//!
//! [`Desk`] owns the board, the selection, and the stats, and runs every
//! operator action as a three-step flow:
//!
//! 1. lock the board, validate the transition and disable the control;
//! 2. release the lock and await the server;
//! 3. lock again and either apply the confirmed outcome (card transition,
//!    stats delta, events) or restore the control.
//!
//! The board lock is never held across an await, so a second click on the
//! same control while its request is in flight observes the disabled
//! control and settles as [`ActionOutcome::Busy`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use replydesk_client::api::CommentApi;
use replydesk_client::messages::{GenerateReplyRequest, PostReplyRequest};
use replydesk_core::board::{Board, BoardSnapshot, DeleteTarget, Location};
use replydesk_core::card::{CardState, CommentCard};
use replydesk_core::comment::Reply;
use replydesk_core::error::CoreError;
use replydesk_core::progress::{BulkKind, ProgressState};
use replydesk_core::selection::{BulkBar, SelectedComment, Selection};
use replydesk_core::stats::{SharedWidget, StatsDelta, StatsReconciler, StatsSnapshot};
use replydesk_core::types::{CommentId, Rating};
use replydesk_events::bus::{DeskEvent, DeskEventKind, EventBus};
use tokio::sync::broadcast;

use crate::action::{ActionKind, ActionOutcome, CardActions};
use crate::error::DeskError;
use crate::notify::{NoProgress, Notifier, ProgressView};
use crate::queue::{BulkConfig, SerialQueue};

/// Shown when a bulk action is triggered with nothing selected.
pub const NO_SELECTION_MESSAGE: &str = "Select at least one comment first.";

/// Asked before any delete.
pub const DELETE_CONFIRM_MESSAGE: &str = "Delete this comment? This cannot be undone.";

fn failure_prefix(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Generate => "Failed to generate reply",
        ActionKind::Post => "Failed to post reply",
        ActionKind::Delete => "Failed to delete comment",
        ActionKind::MarkPending => "Failed to mark as pending",
        ActionKind::UnmarkPending => "Failed to undo pending",
    }
}

struct DeskState {
    board: Board,
    selection: Selection,
    stats: StatsSnapshot,
    reconciler: StatsReconciler,
}

/// Operator-facing controller over one page of comments.
pub struct Desk {
    api: Arc<dyn CommentApi>,
    notifier: Arc<dyn Notifier>,
    progress: Arc<dyn ProgressView>,
    bus: Arc<EventBus>,
    bulk: BulkConfig,
    state: Mutex<DeskState>,
}

impl Desk {
    /// Hydrate a desk from the page snapshot.
    ///
    /// The desk starts without a stats widget; attach one with
    /// [`with_widget`](Self::with_widget).
    pub fn new(
        api: Arc<dyn CommentApi>,
        notifier: Arc<dyn Notifier>,
        snapshot: BoardSnapshot,
    ) -> Self {
        Self {
            api,
            notifier,
            progress: Arc::new(NoProgress),
            bus: Arc::new(EventBus::default()),
            bulk: BulkConfig::default(),
            state: Mutex::new(DeskState {
                board: Board::from_comments(snapshot.comments),
                selection: Selection::new(),
                stats: snapshot.stats,
                reconciler: StatsReconciler::detached(),
            }),
        }
    }

    pub fn with_widget(self, widget: SharedWidget) -> Self {
        self.state().reconciler = StatsReconciler::new(widget);
        self
    }

    pub fn with_progress_view(mut self, progress: Arc<dyn ProgressView>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_bulk_config(mut self, bulk: BulkConfig) -> Self {
        self.bulk = bulk;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeskEvent> {
        self.bus.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, DeskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- read access ----

    /// Model-side counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.state().stats
    }

    pub fn card(&self, comment_id: &str) -> Option<CommentCard> {
        self.state().board.card(comment_id).cloned()
    }

    /// Top-level comment ids in display order.
    pub fn order(&self) -> Vec<CommentId> {
        self.state()
            .board
            .order()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn bulk_bar(&self) -> BulkBar {
        self.state().selection.bar()
    }

    pub fn selected(&self) -> Vec<SelectedComment> {
        let st = self.state();
        st.selection.ordered(&st.board)
    }

    // ---- local UI actions ----

    /// Apply a checkbox change. Only top-level comments can be selected.
    pub fn set_selected(&self, comment_id: &str, checked: bool) -> Result<(), DeskError> {
        let mut st = self.state();
        match st.board.locate(comment_id) {
            Some(Location::Card(_)) => {
                st.selection.set(comment_id, checked);
                Ok(())
            }
            Some(Location::Reply { .. }) => Err(CoreError::Validation(format!(
                "Replies cannot be selected: {comment_id}"
            ))
            .into()),
            None => Err(CoreError::NotFound {
                entity: "comment",
                id: comment_id.to_string(),
            }
            .into()),
        }
    }

    pub fn clear_selection(&self) {
        self.state().selection.clear();
    }

    pub fn select_suggestion(&self, comment_id: &str, text: &str) -> Result<(), DeskError> {
        self.state()
            .board
            .card_mut(comment_id)?
            .select_suggestion(text);
        Ok(())
    }

    pub fn edit_reply(&self, comment_id: &str, text: &str) -> Result<(), DeskError> {
        self.state().board.card_mut(comment_id)?.edit_reply(text);
        Ok(())
    }

    // ---- shared plumbing ----

    /// Apply one confirmed delta to the model, the widget, and the stream.
    fn apply_delta(&self, st: &mut DeskState, delta: StatsDelta) {
        if delta.is_zero() {
            return;
        }
        st.stats.apply(delta);
        st.reconciler.apply(delta);
        self.bus.publish(DeskEvent::stats_changed(delta));
        tracing::debug!(
            unreplied = delta.unreplied,
            pending = delta.pending,
            replied = delta.replied,
            "Stats delta applied",
        );
    }

    fn publish_transition(&self, comment_id: &str, from: CardState, to: CardState) {
        if from == to {
            return;
        }
        tracing::debug!(comment_id, from = from.label(), to = to.label(), "Card transition");
        self.bus.publish(DeskEvent::new(DeskEventKind::CardTransitioned {
            comment_id: comment_id.to_string(),
            from,
            to,
        }));
    }

    /// True when the card was deleted while its own request was in flight.
    /// The server outcome still stands, but there is nothing left to update.
    fn card_removed(&self, st: &DeskState, comment_id: &str, action: &'static str) -> bool {
        if st.board.card(comment_id).is_some() {
            return false;
        }
        tracing::warn!(comment_id, action, "Card removed while its request was in flight");
        true
    }

    /// Turn a flow result into an outcome, notifying the operator on
    /// failure. Busy controls are silent.
    fn settle(
        &self,
        kind: ActionKind,
        comment_id: &str,
        result: Result<ActionOutcome, DeskError>,
    ) -> ActionOutcome {
        match result {
            Ok(outcome) => outcome,
            Err(e) if e.is_busy() => {
                tracing::debug!(comment_id, action = kind.label(), "Control busy, ignoring");
                ActionOutcome::Busy
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(comment_id, action = kind.label(), error = %e, "Action failed");
                self.notifier
                    .alert(&format!("{}: {message}", failure_prefix(kind)));
                ActionOutcome::Failed(message)
            }
        }
    }

    // ---- flows ----

    async fn generate_flow(&self, comment_id: &str) -> Result<(), DeskError> {
        let (request, from) = {
            let mut st = self.state();
            let card = st.board.card_mut(comment_id)?;
            let from = card.state();
            (card.begin_draft()?, from)
        };
        self.publish_transition(comment_id, from, CardState::Drafting);

        let body = GenerateReplyRequest::from(request);
        let result = self.api.generate_draft(&body).await;

        let mut st = self.state();
        if self.card_removed(&st, comment_id, "generate") {
            return result.map(|_| ()).map_err(Into::into);
        }
        let card = st.board.card_mut(comment_id)?;
        match result {
            Ok(suggestions) => {
                let count = suggestions.len();
                card.draft_succeeded(suggestions)?;
                let to = card.state();
                tracing::info!(comment_id, suggestions = count, "Draft generated");
                self.publish_transition(comment_id, CardState::Drafting, to);
                Ok(())
            }
            Err(e) => {
                card.draft_failed();
                let to = card.state();
                self.publish_transition(comment_id, CardState::Drafting, to);
                Err(e.into())
            }
        }
    }

    async fn post_flow(&self, comment_id: &str) -> Result<ActionOutcome, DeskError> {
        let (request, from) = {
            let mut st = self.state();
            let card = st.board.card_mut(comment_id)?;
            let from = card.state();
            match card.begin_post()? {
                Some(request) => (request, from),
                None => return Ok(ActionOutcome::Skipped),
            }
        };

        let body = PostReplyRequest::from(request);
        let result = self.api.post_reply(&body).await;

        let mut st = self.state();
        if self.card_removed(&st, comment_id, "post") {
            return result
                .map(|_| ActionOutcome::Completed)
                .map_err(Into::into);
        }
        match result {
            Ok(posted) => {
                let reply_id = posted.id.clone();
                let reply = Reply::posted(
                    posted.id,
                    body.reply_text,
                    posted.author_name,
                    posted.author_image,
                    posted.published_at,
                    Utc::now().date_naive(),
                );
                let outcome = st.board.apply_post(comment_id, reply)?;
                self.apply_delta(&mut st, outcome.delta);
                tracing::info!(
                    comment_id,
                    reply_id = %reply_id,
                    first_reply = outcome.first_reply,
                    "Reply posted",
                );
                self.publish_transition(comment_id, from, CardState::Replied);
                Ok(ActionOutcome::Completed)
            }
            Err(e) => {
                if let Ok(card) = st.board.card_mut(comment_id) {
                    card.post_failed();
                }
                Err(e.into())
            }
        }
    }

    async fn pending_flow(&self, comment_id: &str, mark: bool) -> Result<(), DeskError> {
        {
            let mut st = self.state();
            let card = st.board.card_mut(comment_id)?;
            if mark {
                card.begin_mark_pending()?;
            } else {
                card.begin_unmark_pending()?;
            }
        }

        let result = if mark {
            self.api.mark_pending(comment_id).await
        } else {
            self.api.unmark_pending(comment_id).await
        };

        let mut st = self.state();
        if self.card_removed(&st, comment_id, "pending") {
            return result.map_err(Into::into);
        }
        let card = st.board.card_mut(comment_id)?;
        match result {
            Ok(()) => {
                let from = card.state();
                let delta = if mark {
                    card.pending_marked()?
                } else {
                    card.pending_unmarked()?
                };
                let to = card.state();
                self.apply_delta(&mut st, delta);
                tracing::info!(comment_id, pending = mark, "Pending mark updated");
                self.publish_transition(comment_id, from, to);
                Ok(())
            }
            Err(e) => {
                card.pending_toggle_failed();
                Err(e.into())
            }
        }
    }

    async fn delete_flow(&self, comment_id: &str) -> Result<(), DeskError> {
        let target = {
            let mut st = self.state();
            st.board.begin_delete(comment_id)?
        };

        let result = self.api.delete_comment(comment_id).await;

        let mut st = self.state();
        if let Err(e) = result {
            st.board.delete_failed(comment_id);
            return Err(e.into());
        }

        let outcome = st.board.delete_succeeded(comment_id)?;
        st.selection.set(comment_id, false);
        self.apply_delta(&mut st, outcome.delta);
        tracing::info!(comment_id, "Comment deleted");
        self.bus.publish(DeskEvent::new(DeskEventKind::CommentRemoved {
            comment_id: comment_id.to_string(),
        }));
        if let DeleteTarget::Reply { parent_id } = target {
            if outcome.delta == StatsDelta::LAST_REPLY_DELETED {
                self.publish_transition(&parent_id, CardState::Replied, CardState::Unreplied);
            }
        }
        Ok(())
    }

    async fn rate_flow(&self, comment_id: &str, rating: Rating) -> Result<(), DeskError> {
        self.state().board.card_mut(comment_id)?.begin_rate()?;

        let result = self.api.rate_comment(comment_id, rating).await;

        let mut st = self.state();
        if self.card_removed(&st, comment_id, "rate") {
            return result.map_err(Into::into);
        }
        let card = st.board.card_mut(comment_id)?;
        match result {
            Ok(()) => {
                card.rated(rating);
                tracing::info!(comment_id, rating = rating.as_str(), "Comment rated");
                Ok(())
            }
            Err(e) => {
                card.rate_failed();
                Err(e.into())
            }
        }
    }

    /// Rate a top-level comment. No stats change.
    pub async fn rate(&self, comment_id: &str, rating: Rating) -> ActionOutcome {
        match self.rate_flow(comment_id, rating).await {
            Ok(()) => ActionOutcome::Completed,
            Err(e) if e.is_busy() => ActionOutcome::Busy,
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(comment_id, error = %e, "Rating failed");
                self.notifier
                    .alert(&format!("Failed to rate comment: {message}"));
                ActionOutcome::Failed(message)
            }
        }
    }

    // ---- bulk ----

    /// Generate drafts for every selected comment, one at a time.
    ///
    /// Returns `None` when nothing ran (empty selection or declined).
    pub async fn bulk_generate(&self) -> Option<ProgressState> {
        self.run_bulk(BulkKind::Generate).await
    }

    /// Mark every selected comment as pending, one at a time.
    pub async fn bulk_mark_pending(&self) -> Option<ProgressState> {
        self.run_bulk(BulkKind::MarkPending).await
    }

    async fn run_bulk(&self, kind: BulkKind) -> Option<ProgressState> {
        let selected = self.selected();
        if selected.is_empty() {
            self.notifier.alert(NO_SELECTION_MESSAGE);
            return None;
        }
        if !self.notifier.confirm(&kind.confirm_message(selected.len())) {
            return None;
        }

        let total = selected.len();
        let delay = match kind {
            BulkKind::Generate => self.bulk.generate_delay,
            BulkKind::MarkPending => self.bulk.pending_delay,
        };
        tracing::info!(?kind, total, delay_ms = delay.as_millis() as u64, "Bulk run started");
        self.progress.open(kind, total);

        let desk = self;
        let view = Arc::clone(&self.progress);
        let progress = SerialQueue::new(selected, delay)
            .run(
                move |item: SelectedComment| async move {
                    let result = match kind {
                        BulkKind::Generate => desk.generate_flow(&item.id).await,
                        BulkKind::MarkPending => desk.pending_flow(&item.id, true).await,
                    };
                    if let Err(e) = &result {
                        tracing::warn!(comment_id = %item.id, ?kind, error = %e, "Bulk item failed");
                    }
                    result
                },
                |p| view.update(p),
            )
            .await;

        self.progress.close();
        self.clear_selection();

        tracing::info!(
            ?kind,
            succeeded = progress.succeeded(),
            failed = progress.failed(),
            "Bulk run finished",
        );
        self.bus.publish(DeskEvent::new(DeskEventKind::BulkFinished {
            kind,
            succeeded: progress.succeeded(),
            failed: progress.failed(),
        }));
        self.notifier.alert(&kind.summary_message(&progress));
        Some(progress)
    }
}

#[async_trait]
impl CardActions for Desk {
    async fn on_generate(&self, comment_id: &str) -> ActionOutcome {
        let result = self
            .generate_flow(comment_id)
            .await
            .map(|()| ActionOutcome::Completed);
        self.settle(ActionKind::Generate, comment_id, result)
    }

    async fn on_post(&self, comment_id: &str) -> ActionOutcome {
        let result = self.post_flow(comment_id).await;
        self.settle(ActionKind::Post, comment_id, result)
    }

    async fn on_delete(&self, comment_id: &str) -> ActionOutcome {
        if !self.notifier.confirm(DELETE_CONFIRM_MESSAGE) {
            return ActionOutcome::Skipped;
        }
        let result = self
            .delete_flow(comment_id)
            .await
            .map(|()| ActionOutcome::Completed);
        self.settle(ActionKind::Delete, comment_id, result)
    }

    async fn on_mark_pending(&self, comment_id: &str) -> ActionOutcome {
        let result = self
            .pending_flow(comment_id, true)
            .await
            .map(|()| ActionOutcome::Completed);
        self.settle(ActionKind::MarkPending, comment_id, result)
    }

    async fn on_unmark_pending(&self, comment_id: &str) -> ActionOutcome {
        let result = self
            .pending_flow(comment_id, false)
            .await
            .map(|()| ActionOutcome::Completed);
        self.settle(ActionKind::UnmarkPending, comment_id, result)
    }
}

//! The comment board: ordered cards hydrated from the page snapshot.
//!
//! Card order is the visible list order. Answering a comment for the first
//! time sinks its card to the bottom of the list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::card::{CommentCard, PostOutcome};
use crate::comment::{Comment, Reply};
use crate::error::CoreError;
use crate::stats::{StatsDelta, StatsSnapshot};
use crate::types::CommentId;

/// Server-rendered page state the board is hydrated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub stats: StatsSnapshot,
}

/// Where an id lives on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Card(usize),
    Reply { card: usize, reply: usize },
}

/// What a delete request targets, resolved before the request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Comment,
    Reply { parent_id: CommentId },
}

/// Result of a confirmed delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub target: DeleteTarget,
    pub delta: StatsDelta,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    cards: Vec<CommentCard>,
    deleting: HashSet<CommentId>,
}

impl Board {
    pub fn from_comments(comments: Vec<Comment>) -> Self {
        Self {
            cards: comments.into_iter().map(CommentCard::from_comment).collect(),
            deleting: HashSet::new(),
        }
    }

    pub fn cards(&self) -> &[CommentCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Ids of the top-level cards in display order.
    pub fn order(&self) -> Vec<&str> {
        self.cards.iter().map(CommentCard::id).collect()
    }

    pub fn locate(&self, id: &str) -> Option<Location> {
        for (card_index, card) in self.cards.iter().enumerate() {
            if card.id() == id {
                return Some(Location::Card(card_index));
            }
            if let Some(reply_index) = card.reply_position(id) {
                return Some(Location::Reply {
                    card: card_index,
                    reply: reply_index,
                });
            }
        }
        None
    }

    pub fn card(&self, id: &str) -> Option<&CommentCard> {
        self.cards.iter().find(|c| c.id() == id)
    }

    pub fn card_mut(&mut self, id: &str) -> Result<&mut CommentCard, CoreError> {
        self.cards
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| not_found("comment", id))
    }

    /// Move a card to the bottom of the list.
    pub fn relocate_to_end(&mut self, id: &str) {
        if let Some(index) = self.cards.iter().position(|c| c.id() == id) {
            let card = self.cards.remove(index);
            self.cards.push(card);
        }
    }

    /// Record a confirmed post. A first reply also sinks the card to the
    /// bottom of the list.
    pub fn apply_post(&mut self, id: &str, reply: Reply) -> Result<PostOutcome, CoreError> {
        let outcome = self.card_mut(id)?.post_succeeded(reply)?;
        if outcome.first_reply {
            self.relocate_to_end(id);
        }
        Ok(outcome)
    }

    // ---- deletion ----

    pub fn is_deleting(&self, id: &str) -> bool {
        self.deleting.contains(id)
    }

    /// Resolve and lock the delete control for `id`.
    pub fn begin_delete(&mut self, id: &str) -> Result<DeleteTarget, CoreError> {
        let target = match self.locate(id) {
            None => return Err(not_found("comment", id)),
            Some(Location::Card(_)) => DeleteTarget::Comment,
            Some(Location::Reply { card, .. }) => DeleteTarget::Reply {
                parent_id: self.cards[card].id().to_string(),
            },
        };
        if !self.deleting.insert(id.to_string()) {
            return Err(CoreError::Conflict(format!(
                "delete already in flight for comment {id}"
            )));
        }
        Ok(target)
    }

    pub fn delete_failed(&mut self, id: &str) {
        self.deleting.remove(id);
    }

    /// Remove a confirmed-deleted element from the board.
    pub fn delete_succeeded(&mut self, id: &str) -> Result<DeleteOutcome, CoreError> {
        self.deleting.remove(id);
        match self.locate(id) {
            None => Err(not_found("comment", id)),
            Some(Location::Card(index)) => {
                self.cards.remove(index);
                Ok(DeleteOutcome {
                    target: DeleteTarget::Comment,
                    delta: StatsDelta::NONE,
                })
            }
            Some(Location::Reply { card, .. }) => {
                let parent = &mut self.cards[card];
                let delta = parent.remove_reply(id)?;
                Ok(DeleteOutcome {
                    target: DeleteTarget::Reply {
                        parent_id: parent.id().to_string(),
                    },
                    delta,
                })
            }
        }
    }
}

fn not_found(entity: &'static str, id: &str) -> CoreError {
    CoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;
    use crate::card::CardState;

    fn comment(id: &str) -> Comment {
        Comment {
            id: id.to_string(),
            video_id: "vid".to_string(),
            text: format!("comment {id}"),
            marked_pending: false,
            replies: Vec::new(),
        }
    }

    fn own_reply(id: &str) -> Reply {
        Reply::posted(
            id.to_string(),
            "thanks".to_string(),
            None,
            None,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    fn board() -> Board {
        Board::from_comments(vec![comment("a"), comment("b"), comment("c")])
    }

    fn post(board: &mut Board, id: &str, reply_id: &str) -> PostOutcome {
        let card = board.card_mut(id).unwrap();
        card.begin_draft().unwrap();
        card.draft_succeeded(vec!["hi".into()]).unwrap();
        card.select_suggestion("hi");
        card.begin_post().unwrap().unwrap();
        board.apply_post(id, own_reply(reply_id)).unwrap()
    }

    #[test]
    fn snapshot_deserializes() {
        let snapshot: BoardSnapshot = serde_json::from_value(serde_json::json!({
            "comments": [{"id": "a", "video_id": "v", "text": "hello"}],
            "stats": {"unreplied": 3, "pending": 1, "replied": 2},
        }))
        .unwrap();
        assert_eq!(snapshot.comments.len(), 1);
        assert_eq!(snapshot.stats, StatsSnapshot::new(3, 1, 2));
    }

    #[test]
    fn first_reply_sinks_card_to_bottom() {
        let mut board = board();
        let outcome = post(&mut board, "a", "ra");

        assert!(outcome.first_reply);
        assert_eq!(board.order(), ["b", "c", "a"]);
    }

    #[test]
    fn re_reply_keeps_position() {
        let mut board = board();
        post(&mut board, "a", "r1");
        post(&mut board, "b", "r2");
        assert_eq!(board.order(), ["c", "a", "b"]);

        let outcome = post(&mut board, "a", "r3");
        assert!(!outcome.first_reply);
        assert_eq!(board.order(), ["c", "a", "b"]);
    }

    #[test]
    fn locate_finds_cards_and_replies() {
        let mut board = board();
        post(&mut board, "b", "rb");

        assert_eq!(board.locate("a"), Some(Location::Card(0)));
        assert_eq!(board.locate("rb"), Some(Location::Reply { card: 2, reply: 0 }));
        assert_eq!(board.locate("zzz"), None);
    }

    #[test]
    fn delete_top_level_comment_removes_card() {
        let mut board = board();
        assert_eq!(board.begin_delete("b").unwrap(), DeleteTarget::Comment);

        let outcome = board.delete_succeeded("b").unwrap();

        assert_eq!(outcome.delta, StatsDelta::NONE);
        assert_eq!(board.order(), ["a", "c"]);
        assert!(!board.is_deleting("b"));
    }

    #[test]
    fn delete_last_own_reply_reverts_parent() {
        let mut board = board();
        post(&mut board, "a", "ra");

        assert_eq!(
            board.begin_delete("ra").unwrap(),
            DeleteTarget::Reply {
                parent_id: "a".into()
            }
        );
        let outcome = board.delete_succeeded("ra").unwrap();

        assert_eq!(outcome.delta, StatsDelta::LAST_REPLY_DELETED);
        assert_eq!(board.card("a").unwrap().state(), CardState::Unreplied);
    }

    #[test]
    fn delete_non_last_reply_has_no_delta() {
        let mut board = board();
        post(&mut board, "a", "r1");
        post(&mut board, "a", "r2");

        board.begin_delete("r2").unwrap();
        let outcome = board.delete_succeeded("r2").unwrap();

        assert_eq!(outcome.delta, StatsDelta::NONE);
        assert_eq!(board.card("a").unwrap().state(), CardState::Replied);
    }

    #[test]
    fn concurrent_delete_is_rejected() {
        let mut board = board();
        board.begin_delete("a").unwrap();
        assert_matches!(board.begin_delete("a"), Err(CoreError::Conflict(_)));

        board.delete_failed("a");
        assert!(board.begin_delete("a").is_ok());
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let mut board = board();
        assert_matches!(
            board.begin_delete("ghost"),
            Err(CoreError::NotFound { .. })
        );
    }
}

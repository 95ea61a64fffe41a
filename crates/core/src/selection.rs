//! Bulk selection of top-level comments and the bulk-action bar.

use std::collections::HashSet;

use crate::board::Board;
use crate::types::CommentId;

/// Visibility and label of the bulk-action bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkBar {
    pub visible: bool,
    pub label: String,
}

/// A selected comment, with the inputs a bulk action needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedComment {
    pub id: CommentId,
    pub video_id: String,
    pub text: String,
}

/// Set of checked comment ids.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<CommentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a checkbox change.
    pub fn set(&mut self, id: &str, checked: bool) {
        if checked {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Hidden when nothing is selected, otherwise `"{n} selected"`.
    pub fn bar(&self) -> BulkBar {
        let n = self.len();
        BulkBar {
            visible: n > 0,
            label: if n > 0 {
                format!("{n} selected")
            } else {
                String::new()
            },
        }
    }

    /// Selected top-level comments in board order.
    ///
    /// Ids that are not top-level cards on the board are skipped.
    pub fn ordered(&self, board: &Board) -> Vec<SelectedComment> {
        board
            .cards()
            .iter()
            .filter(|card| self.ids.contains(card.id()))
            .map(|card| SelectedComment {
                id: card.id().to_string(),
                video_id: card.video_id().to_string(),
                text: card.text().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::Comment;

    fn board() -> Board {
        Board::from_comments(
            ["a", "b", "c"]
                .iter()
                .map(|id| Comment {
                    id: id.to_string(),
                    video_id: "vid".to_string(),
                    text: format!("text {id}"),
                    marked_pending: false,
                    replies: Vec::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn bar_hidden_when_empty() {
        let selection = Selection::new();
        let bar = selection.bar();
        assert!(!bar.visible);
        assert!(bar.label.is_empty());
    }

    #[test]
    fn bar_counts_selection() {
        let mut selection = Selection::new();
        selection.set("a", true);
        selection.set("b", true);
        selection.set("b", true);
        assert_eq!(selection.bar().label, "2 selected");

        selection.set("a", false);
        assert_eq!(selection.bar().label, "1 selected");
    }

    #[test]
    fn ordered_follows_board_order_and_skips_unknown() {
        let mut selection = Selection::new();
        selection.set("c", true);
        selection.set("ghost", true);
        selection.set("a", true);

        let ids: Vec<_> = selection
            .ordered(&board())
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn clear_empties_selection() {
        let mut selection = Selection::new();
        selection.set("a", true);
        selection.clear();
        assert!(selection.is_empty());
        assert!(!selection.bar().visible);
    }
}

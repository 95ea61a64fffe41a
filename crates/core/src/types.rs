//! Shared primitive types.

use serde::{Deserialize, Serialize};

/// Server-assigned comment identifier (YouTube comment id).
pub type CommentId = String;

/// Rating an operator can leave on a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Like,
    Dislike,
    #[default]
    None,
}

impl Rating {
    /// Wire value sent to the server.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::None => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_serializes_as_wire_value() {
        assert_eq!(serde_json::to_value(Rating::Like).unwrap(), "like");
        assert_eq!(serde_json::to_value(Rating::None).unwrap(), "none");
        assert_eq!(Rating::Dislike.as_str(), "dislike");
    }

    #[test]
    fn default_rating_is_none() {
        assert_eq!(Rating::default(), Rating::None);
    }
}

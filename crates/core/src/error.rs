use crate::types::CommentId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: CommentId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A control is disabled because its own request is still in flight.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot {action} while the comment is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

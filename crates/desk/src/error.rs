use replydesk_client::api::ClientError;
use replydesk_core::error::CoreError;

/// Failure of one operator action.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// The board rejected the transition (unknown id, busy control, or an
    /// action the card does not offer in its current state).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The server call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl DeskError {
    /// The control is disabled because its own request is still in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Core(CoreError::Conflict(_)))
    }

    /// Text shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Core(e) => e.to_string(),
            Self::Client(e) => e.user_message(),
        }
    }
}

use chatline_core::store::StoreError;

/// Failures reported by the chat and message operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat not found")]
    ChatNotFound,

    #[error("Message not found")]
    MessageNotFound,

    #[error("No account found")]
    NoAccountFound,

    #[error("User is not a participant of this chat")]
    NotParticipant,

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Infrastructure(#[from] StoreError),
}

pub type ChatResult<T> = Result<T, ChatError>;

use thiserror::Error;

/// Reasons an event cannot be applied. The store logs these and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Event without a message id ({kind})")]
    MissingMessageId { kind: &'static str },

    #[error("Message {message_id} is already finalized, dropping {kind}")]
    AlreadyFinalized {
        message_id: String,
        kind: &'static str,
    },

    #[error("Tool call not found: {0}")]
    ToolCallNotFound(String),

    #[error("Tool call chunk for message {0} arrived before any tool call")]
    OrphanToolCallChunk(String),

    #[error("Podcast update for non-podcast message {0}")]
    NotAPodcast(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

use thiserror::Error;

/// Failure while reading the chat event stream.
#[derive(Error, Debug)]
pub enum StreamError {
    /// One frame could not be decoded; later frames may still be fine.
    #[error("Malformed {event} event: {source}")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid UTF-8 in event stream: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The connection broke; nothing more will arrive.
    #[error("Stream error: {0}")]
    Transport(String),
}

impl StreamError {
    /// Whether the stream can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StreamError::Transport(_))
    }
}

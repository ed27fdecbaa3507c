use anyhow::Result;
use async_trait::async_trait;
use unghost_types::ServerConfig;

use crate::request::{ChatRequest, EnhanceRequest};
use crate::sse::ChatEventStream;

/// Everything the chat session needs from the backend.
///
/// Implemented over HTTP by [`crate::UnghostClient`]; tests substitute an
/// in-memory backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Start a chat turn and stream its events
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatEventStream>;

    /// Rewrite a prompt in the requested report style
    async fn enhance_prompt(&self, request: EnhanceRequest) -> Result<String>;

    /// Turn a report into podcast audio (mp3 bytes)
    async fn generate_podcast(&self, content: &str) -> Result<Vec<u8>>;

    async fn fetch_config(&self) -> Result<ServerConfig>;

    /// Stream a recorded transcript by replay id
    async fn fetch_replay(&self, replay_id: &str) -> Result<ChatEventStream>;
}

pub mod client;
pub mod config;
pub mod error;
pub mod replay;
pub mod request;
pub mod sse;
pub mod traits;

pub use client::UnghostClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::StreamError;
pub use replay::extract_replay_id;
pub use request::{ChatRequest, ChatTurn, EnhanceRequest, PodcastRequest};
pub use sse::{parse_chat_event_stream, ChatEventStream, CircularLineBuffer, SseFrame, SseFrameDecoder};
pub use traits::ChatBackend;

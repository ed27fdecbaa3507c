//! # Unghost
//!
//! Client library for the Unghost outreach agents. A backend runs a team of
//! agents (coordinator, planner, researcher, coder, reporter) that research a
//! contact and draft a personalized message; this library rebuilds that work
//! from the backend's event stream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unghost::prelude::*;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = UnghostClient::new(ClientConfig::default())?;
//!     let mut store = MessageStore::new("thread-1");
//!
//!     let request = ChatRequest::new(store.thread_id(), "Draft an intro to Sarah Johnson");
//!     let mut events = client.chat_stream(request).await?;
//!
//!     while let Some(event) = events.next().await {
//!         match event {
//!             Ok(event) => {
//!                 for update in event.into_message_events() {
//!                     store.apply_event(update);
//!                 }
//!             }
//!             Err(e) if e.is_recoverable() => continue,
//!             Err(e) => return Err(e.into()),
//!         }
//!     }
//!
//!     for message in store.messages() {
//!         println!("{}", message.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`unghost-types`**: messages, wire events, settings and the lenient JSON parser
//! - **`unghost-store`**: the message store, research threads and persisted settings
//! - **`unghost-client`**: SSE decoding and the HTTP backend client
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use unghost_types::{
    parse_exact, parse_partial, Agent, ChatEvent, EventPayload, FeedbackOption, FinishReason,
    Message, MessageEvent, Partial, PlanPreview, PodcastContent, ReportStyle, Resource, Role,
    ServerConfig, Settings, ToolCall,
};

pub use unghost_store::{MessageStore, ResearchThreads, SettingsError, SettingsStore, StoreError};

pub use unghost_client::{
    extract_replay_id, parse_chat_event_stream, ChatBackend, ChatEventStream, ChatRequest,
    ClientConfig, EnhanceRequest, StreamError, UnghostClient,
};

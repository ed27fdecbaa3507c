//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use unghost::prelude::*;
//! ```

pub use crate::{
    Agent, ChatEvent, EventPayload, FeedbackOption, FinishReason, Message, MessageEvent,
    PlanPreview, PodcastContent, Resource, Role, Settings, ReportStyle,
    MessageStore, ResearchThreads, SettingsStore, StoreError,
    ChatBackend, ChatRequest, ClientConfig, EnhanceRequest, UnghostClient,
};

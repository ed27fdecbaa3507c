pub mod config;
pub mod events;
pub mod json;
pub mod message;
pub mod plan;
pub mod podcast;
pub mod settings;

pub use config::{ModelConfig, RagConfig, ServerConfig};
pub use events::{
    ChatEvent, EventHeader, EventPayload, InterruptData, MessageChunkData, MessageEvent,
    ToolCallChunk, ToolCallChunksData, ToolCallHead, ToolCallResultData, ToolCallsData,
};
pub use json::{parse_exact, parse_partial, parse_partial_value, Partial};
pub use message::{Agent, FeedbackOption, FinishReason, Message, Resource, Role, ToolCall};
pub use plan::{PlanPreview, StepPreview};
pub use podcast::PodcastContent;
pub use settings::{
    ChatStreamSettings, GeneralSettings, McpRequestSettings, McpServerMetadata,
    McpServerRequest, McpSettings, McpTool, McpTransport, ReportStyle, Settings,
};

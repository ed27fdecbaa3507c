use serde::{Deserialize, Serialize};

use crate::message::{Agent, FeedbackOption, FinishReason, Resource, Role};
use crate::podcast::PodcastContent;

/// Fields shared by every wire event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageChunkData {
    #[serde(flatten)]
    pub header: EventHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

/// Tool call as announced by the model, before its arguments have streamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallHead {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Fragment of a tool call's JSON arguments.
///
/// A chunk carrying an `id` starts the arguments of that call; chunks without
/// one continue the call at `index`, or the call whose arguments are streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub args: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallsData {
    #[serde(flatten)]
    pub header: EventHeader,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallHead>,
    #[serde(default)]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunksData {
    #[serde(flatten)]
    pub header: EventHeader,
    #[serde(default)]
    pub tool_call_chunks: Vec<ToolCallChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResultData {
    #[serde(flatten)]
    pub header: EventHeader,
    pub tool_call_id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptData {
    #[serde(flatten)]
    pub header: EventHeader,
    #[serde(default)]
    pub options: Vec<FeedbackOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Event as delivered by the backend's chat stream.
///
/// The SSE `event:` line selects the variant and the `data:` line holds its
/// payload, which maps onto serde's adjacent tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageChunk(MessageChunkData),
    ToolCalls(ToolCallsData),
    ToolCallChunks(ToolCallChunksData),
    ToolCallResult(ToolCallResultData),
    Interrupt(InterruptData),
}

impl ChatEvent {
    /// Decode one SSE frame.
    pub fn from_sse(event: &str, data: &str) -> Result<Self, serde_json::Error> {
        let data: serde_json::Value = serde_json::from_str(data)?;
        serde_json::from_value(serde_json::json!({
            "event": event,
            "data": data,
        }))
    }

    pub fn header(&self) -> &EventHeader {
        match self {
            ChatEvent::MessageChunk(data) => &data.header,
            ChatEvent::ToolCalls(data) => &data.header,
            ChatEvent::ToolCallChunks(data) => &data.header,
            ChatEvent::ToolCallResult(data) => &data.header,
            ChatEvent::Interrupt(data) => &data.header,
        }
    }

    /// Split a wire event into the store updates it implies, in application order.
    pub fn into_message_events(self) -> Vec<MessageEvent> {
        let mut payloads = Vec::new();
        let header = match self {
            ChatEvent::MessageChunk(data) => {
                if let Some(text) = data.content.filter(|t| !t.is_empty()) {
                    payloads.push(EventPayload::ContentDelta { text });
                }
                if let Some(text) = data.reasoning_content.filter(|t| !t.is_empty()) {
                    payloads.push(EventPayload::ReasoningDelta { text });
                }
                data.header
            }
            ChatEvent::ToolCalls(data) => {
                let announces_calls = data
                    .tool_calls
                    .first()
                    .map_or(false, |call| !call.name.is_empty());
                if announces_calls {
                    payloads.push(EventPayload::ToolCalls {
                        calls: data.tool_calls,
                    });
                }
                if !data.tool_call_chunks.is_empty() {
                    payloads.push(EventPayload::ToolCallChunks {
                        chunks: data.tool_call_chunks,
                    });
                }
                if let Some(text) = data.content.filter(|t| !t.is_empty()) {
                    payloads.push(EventPayload::ContentDelta { text });
                }
                data.header
            }
            ChatEvent::ToolCallChunks(data) => {
                if !data.tool_call_chunks.is_empty() {
                    payloads.push(EventPayload::ToolCallChunks {
                        chunks: data.tool_call_chunks,
                    });
                }
                data.header
            }
            ChatEvent::ToolCallResult(data) => {
                // Results are routed by tool call id, never finalize anything.
                let header = data.header;
                return vec![MessageEvent {
                    id: header.id,
                    thread_id: header.thread_id,
                    role: header.role,
                    agent: header.agent,
                    payload: EventPayload::ToolCallResult {
                        tool_call_id: data.tool_call_id,
                        content: data.content,
                    },
                }];
            }
            ChatEvent::Interrupt(mut data) => {
                payloads.push(EventPayload::Options {
                    options: data.options,
                });
                data.header
                    .finish_reason
                    .get_or_insert(FinishReason::Interrupt);
                data.header
            }
        };

        if let Some(finish_reason) = header.finish_reason.clone() {
            payloads.push(EventPayload::StreamEnd {
                finish_reason: Some(finish_reason),
            });
        }

        // An empty chunk still announces the message.
        if payloads.is_empty() {
            payloads.push(EventPayload::ContentDelta {
                text: String::new(),
            });
        }

        payloads
            .into_iter()
            .map(|payload| MessageEvent {
                id: header.id.clone(),
                thread_id: header.thread_id.clone(),
                role: header.role,
                agent: header.agent.clone(),
                payload,
            })
            .collect()
    }
}

/// One update applied by the message store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// Append to `content`.
    ContentDelta { text: String },
    /// Replace `content` wholesale.
    ContentReplace { text: String },
    /// Append to `reasoning_content`.
    ReasoningDelta { text: String },
    /// Replace the feedback options.
    Options { options: Vec<FeedbackOption> },
    /// Replace the attached resources.
    Resources { resources: Vec<Resource> },
    /// Replace the tool calls of the message.
    ToolCalls { calls: Vec<ToolCallHead> },
    /// Append argument fragments to the message's tool calls.
    ToolCallChunks { chunks: Vec<ToolCallChunk> },
    /// Attach a result to whichever message owns `tool_call_id`.
    ToolCallResult {
        tool_call_id: String,
        content: String,
    },
    /// Replace the podcast state of a podcast message.
    PodcastUpdate { podcast: PodcastContent },
    /// Finalize the message.
    StreamEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish_reason: Option<FinishReason>,
    },
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::ContentDelta { .. } => "content_delta",
            EventPayload::ContentReplace { .. } => "content_replace",
            EventPayload::ReasoningDelta { .. } => "reasoning_delta",
            EventPayload::Options { .. } => "options",
            EventPayload::Resources { .. } => "resources",
            EventPayload::ToolCalls { .. } => "tool_calls",
            EventPayload::ToolCallChunks { .. } => "tool_call_chunks",
            EventPayload::ToolCallResult { .. } => "tool_call_result",
            EventPayload::PodcastUpdate { .. } => "podcast_update",
            EventPayload::StreamEnd { .. } => "stream_end",
        }
    }
}

/// Update targeting one message id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl MessageEvent {
    pub fn new(id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: id.into(),
            thread_id: String::new(),
            role: Role::Assistant,
            agent: None,
            payload,
        }
    }

    pub fn content_delta(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, EventPayload::ContentDelta { text: text.into() })
    }

    pub fn reasoning_delta(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, EventPayload::ReasoningDelta { text: text.into() })
    }

    pub fn stream_end(id: impl Into<String>) -> Self {
        Self::new(id, EventPayload::StreamEnd { finish_reason: None })
    }

    pub fn with_agent(mut self, agent: impl Into<Agent>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
}

/// Agent that produced an assistant message.
///
/// The backend may introduce new agents at any time, so unknown names are kept
/// verbatim in [`Agent::Other`] instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Agent {
    Coordinator,
    Planner,
    Researcher,
    Coder,
    Reporter,
    Podcast,
    Other(String),
}

impl Agent {
    pub fn as_str(&self) -> &str {
        match self {
            Agent::Coordinator => "coordinator",
            Agent::Planner => "planner",
            Agent::Researcher => "researcher",
            Agent::Coder => "coder",
            Agent::Reporter => "reporter",
            Agent::Podcast => "podcast",
            Agent::Other(name) => name,
        }
    }

    /// Agents whose messages belong to a research thread rather than the main chat.
    pub fn is_research_activity(&self) -> bool {
        matches!(self, Agent::Researcher | Agent::Coder | Agent::Reporter)
    }
}

impl From<String> for Agent {
    fn from(name: String) -> Self {
        match name.as_str() {
            "coordinator" => Agent::Coordinator,
            "planner" => Agent::Planner,
            "researcher" => Agent::Researcher,
            "coder" => Agent::Coder,
            "reporter" => Agent::Reporter,
            "podcast" => Agent::Podcast,
            _ => Agent::Other(name),
        }
    }
}

impl From<&str> for Agent {
    fn from(name: &str) -> Self {
        Agent::from(name.to_string())
    }
}

impl From<Agent> for String {
    fn from(agent: Agent) -> Self {
        agent.as_str().to_string()
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the backend stopped streaming a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    Stop,
    Interrupt,
    ToolCalls,
    Other(String),
}

impl From<String> for FinishReason {
    fn from(reason: String) -> Self {
        match reason.as_str() {
            "stop" => FinishReason::Stop,
            "interrupt" => FinishReason::Interrupt,
            "tool_calls" => FinishReason::ToolCalls,
            _ => FinishReason::Other(reason),
        }
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        match reason {
            FinishReason::Stop => "stop".to_string(),
            FinishReason::Interrupt => "interrupt".to_string(),
            FinishReason::ToolCalls => "tool_calls".to_string(),
            FinishReason::Other(reason) => reason,
        }
    }
}

/// A feedback choice offered by an interrupt (e.g. "Start research").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackOption {
    pub text: String,
    pub value: String,
}

impl FeedbackOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// A resource attached to a message or a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
    /// Raw argument fragments received while streaming; folded into `args` on finalization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args_chunks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
            args_chunks: Vec::new(),
            result: None,
        }
    }
}

/// A chat or research message as reconstructed from the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_chunks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning_content_chunks: Vec<String>,
    pub is_streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FeedbackOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Empty streaming message, the shape every message starts in.
    pub fn streaming(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        role: Role,
        agent: Option<Agent>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            role,
            agent,
            content: String::new(),
            content_chunks: Vec::new(),
            reasoning_content: None,
            reasoning_content_chunks: Vec::new(),
            is_streaming: true,
            finish_reason: None,
            interrupt_feedback: None,
            options: Vec::new(),
            resources: Vec::new(),
            tool_calls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Locally authored user message with a fresh id.
    pub fn user(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let mut message = Self::streaming(
            uuid::Uuid::new_v4().to_string(),
            thread_id,
            Role::User,
            None,
        );
        message.content_chunks.push(content.clone());
        message.content = content;
        message.is_streaming = false;
        message
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_interrupt_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.interrupt_feedback = Some(feedback.into());
        self
    }

    pub fn is_agent(&self, agent: &Agent) -> bool {
        self.agent.as_ref() == Some(agent)
    }

    /// True when a finalized message carries nothing to render.
    pub fn is_empty(&self) -> bool {
        !self.is_streaming
            && self.content.trim().is_empty()
            && self
                .reasoning_content
                .as_deref()
                .map_or(true, |r| r.trim().is_empty())
            && self.tool_calls.is_empty()
            && self.options.is_empty()
    }

    pub fn is_interrupt(&self) -> bool {
        self.finish_reason == Some(FinishReason::Interrupt)
    }
}

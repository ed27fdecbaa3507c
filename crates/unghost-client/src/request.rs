use serde::{Deserialize, Serialize};
use unghost_types::{ChatStreamSettings, ReportStyle, Resource, Role, Settings};

/// One turn sent to the backend. Only the new user turn is sent; the server
/// keeps the thread history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of `POST chat/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    pub thread_id: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_feedback: Option<String>,
    #[serde(default)]
    pub enable_background_investigation: bool,
    #[serde(flatten)]
    pub settings: ChatStreamSettings,
}

impl ChatRequest {
    pub fn new(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatTurn::user(content)],
            thread_id: thread_id.into(),
            resources: Vec::new(),
            interrupt_feedback: None,
            enable_background_investigation: true,
            settings: Settings::default().chat_stream_settings(),
        }
    }

    pub fn with_settings(mut self, settings: ChatStreamSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_interrupt_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.interrupt_feedback = Some(feedback.into());
        self
    }

    pub fn with_background_investigation(mut self, enabled: bool) -> Self {
        self.enable_background_investigation = enabled;
        self
    }
}

/// Body of `POST prompt/enhance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub report_style: ReportStyle,
}

impl EnhanceRequest {
    pub fn new(prompt: impl Into<String>, report_style: ReportStyle) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
            report_style,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EnhanceResponse {
    pub result: String,
}

/// Body of `POST podcast/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastRequest {
    pub content: String,
}

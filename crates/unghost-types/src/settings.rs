use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tone of the drafted outreach message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStyle {
    Aggressive,
    Conservative,
    GoNuts,
    #[default]
    Friendly,
}

impl ReportStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStyle::Aggressive => "aggressive",
            ReportStyle::Conservative => "conservative",
            ReportStyle::GoNuts => "go_nuts",
            ReportStyle::Friendly => "friendly",
        }
    }
}

impl std::str::FromStr for ReportStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aggressive" => Ok(ReportStyle::Aggressive),
            "conservative" => Ok(ReportStyle::Conservative),
            "go_nuts" => Ok(ReportStyle::GoNuts),
            "friendly" => Ok(ReportStyle::Friendly),
            other => Err(format!("unknown report style: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub auto_accepted_plan: bool,
    pub max_plan_iterations: u32,
    pub max_step_num: u32,
    pub max_search_results: u32,
    pub report_style: ReportStyle,
    pub user_background: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            auto_accepted_plan: false,
            max_plan_iterations: 1,
            max_step_num: 3,
            max_search_results: 3,
            report_style: ReportStyle::Friendly,
            user_background: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpTransport {
    Stdio,
    Sse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// An MCP server configured by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerMetadata {
    pub name: String,
    pub transport: McpTransport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tools: Vec<McpTool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpSettings {
    #[serde(default)]
    pub servers: Vec<McpServerMetadata>,
}

/// User settings persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub mcp: McpSettings,
}

/// MCP server entry as sent with a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerRequest {
    pub name: String,
    pub transport: McpTransport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    pub enabled_tools: Vec<String>,
    pub add_to_agents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpRequestSettings {
    pub servers: HashMap<String, McpServerRequest>,
}

/// Settings forwarded with every chat stream request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStreamSettings {
    #[serde(flatten)]
    pub general: GeneralSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_settings: Option<McpRequestSettings>,
}

impl Settings {
    pub fn chat_stream_settings(&self) -> ChatStreamSettings {
        let servers: HashMap<String, McpServerRequest> = self
            .mcp
            .servers
            .iter()
            .filter(|server| server.enabled)
            .map(|server| {
                // stdio servers are launched by command, sse servers are reached by url
                let (command, args, url) = match server.transport {
                    McpTransport::Stdio => (server.command.clone(), server.args.clone(), None),
                    McpTransport::Sse => (None, Vec::new(), server.url.clone()),
                };
                let request = McpServerRequest {
                    name: server.name.clone(),
                    transport: server.transport,
                    command,
                    args,
                    url,
                    env: server.env.clone(),
                    enabled_tools: server.tools.iter().map(|tool| tool.name.clone()).collect(),
                    add_to_agents: vec!["researcher".to_string()],
                };
                (server.name.clone(), request)
            })
            .collect();

        ChatStreamSettings {
            general: self.general.clone(),
            mcp_settings: (!servers.is_empty()).then(|| McpRequestSettings { servers }),
        }
    }
}

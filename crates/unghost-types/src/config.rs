use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub basic: Vec<String>,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub provider: Option<String>,
}

/// Configuration published by the backend at `GET /api/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub models: ModelConfig,
}

impl ServerConfig {
    pub fn rag_provider(&self) -> Option<&str> {
        self.rag.provider.as_deref()
    }
}

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";

/// Connection settings for [`crate::UnghostClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root; always ends with `/` so relative paths join beneath it
    pub base_url: String,

    /// Where `<id>.txt` transcripts live; defaults to `<base_url>replay/`
    #[serde(default)]
    pub replay_base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            replay_base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: with_trailing_slash(base_url.into()),
            ..Self::default()
        }
    }

    pub fn with_replay_base_url(mut self, url: impl Into<String>) -> Self {
        self.replay_base_url = Some(with_trailing_slash(url.into()));
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn replay_base(&self) -> String {
        match &self.replay_base_url {
            Some(url) => with_trailing_slash(url.clone()),
            None => format!("{}replay/", with_trailing_slash(self.base_url.clone())),
        }
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let config = ClientConfig::new("http://example.com/api");
        assert_eq!(config.base_url, "http://example.com/api/");
        assert_eq!(config.replay_base(), "http://example.com/api/replay/");
    }

    #[test]
    fn test_replay_override() {
        let config = ClientConfig::default().with_replay_base_url("https://cdn.example.com/replays");
        assert_eq!(config.replay_base(), "https://cdn.example.com/replays/");
    }
}

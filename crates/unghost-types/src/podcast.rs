use serde::{Deserialize, Serialize};

/// Content of a podcast message, stored as JSON in the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastContent {
    pub task_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PodcastContent {
    pub fn pending(title: Option<String>) -> Self {
        Self {
            task_type: "podcast".to_string(),
            title,
            audio_url: None,
            error: None,
        }
    }

    pub fn ready(title: Option<String>, audio_url: impl Into<String>) -> Self {
        Self {
            audio_url: Some(audio_url.into()),
            ..Self::pending(title)
        }
    }

    pub fn failed(title: Option<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::pending(title)
        }
    }

    /// Generation finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        self.audio_url.is_some() || self.error.is_some()
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Response, Url};
use unghost_types::ServerConfig;

use crate::config::ClientConfig;
use crate::request::{ChatRequest, EnhanceRequest, EnhanceResponse, PodcastRequest};
use crate::sse::{parse_chat_event_stream, ChatEventStream};
use crate::traits::ChatBackend;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend client (HTTP direct)
pub struct UnghostClient {
    http_client: reqwest::Client,
    base_url: Url,
    replay_base_url: Url,
    timeout: Duration,
}

impl UnghostClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Chat streams may run for many minutes, so only the connect phase
        // has a client-wide limit.
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid base URL: {}", config.base_url))?;
        let replay_base = config.replay_base();
        let replay_base_url = Url::parse(&replay_base)
            .with_context(|| format!("Invalid replay URL: {}", replay_base))?;

        Ok(Self {
            http_client,
            base_url,
            replay_base_url,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Client for the default local backend
    pub fn local() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid endpoint path: {}", path))
    }

    async fn check_status(response: Response, api: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("{} API error ({}): {}", api, status, error_text);
    }
}

#[async_trait]
impl ChatBackend for UnghostClient {
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatEventStream> {
        let url = self.endpoint("chat/stream")?;
        tracing::debug!(thread_id = %request.thread_id, %url, "Starting chat stream");

        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await
            .context("Failed to send chat request")?;

        let response = Self::check_status(response, "Chat").await?;
        Ok(parse_chat_event_stream(response.bytes_stream()))
    }

    async fn enhance_prompt(&self, request: EnhanceRequest) -> Result<String> {
        let url = self.endpoint("prompt/enhance")?;

        let response = self
            .http_client
            .post(url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .context("Failed to send enhance request")?;

        let response = Self::check_status(response, "Prompt enhancer").await?;
        let body: EnhanceResponse = response
            .json()
            .await
            .context("Failed to parse enhance response")?;

        Ok(body.result)
    }

    async fn generate_podcast(&self, content: &str) -> Result<Vec<u8>> {
        let url = self.endpoint("podcast/generate")?;

        let response = self
            .http_client
            .post(url)
            .timeout(self.timeout)
            .json(&PodcastRequest {
                content: content.to_string(),
            })
            .send()
            .await
            .context("Failed to send podcast request")?;

        let response = Self::check_status(response, "Podcast").await?;
        let audio = response
            .bytes()
            .await
            .context("Failed to read podcast audio")?;

        tracing::debug!(bytes = audio.len(), "Podcast audio received");
        Ok(audio.to_vec())
    }

    async fn fetch_config(&self) -> Result<ServerConfig> {
        let url = self.endpoint("config")?;

        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .context("Failed to fetch server config")?;

        let response = Self::check_status(response, "Config").await?;
        response
            .json()
            .await
            .context("Failed to parse server config")
    }

    async fn fetch_replay(&self, replay_id: &str) -> Result<ChatEventStream> {
        let url = self
            .replay_base_url
            .join(&format!("{}.txt", replay_id))
            .with_context(|| format!("Invalid replay id: {}", replay_id))?;
        tracing::debug!(%url, "Fetching replay");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .context("Failed to fetch replay")?;

        let response = Self::check_status(response, "Replay").await?;
        Ok(parse_chat_event_stream(response.bytes_stream()))
    }
}

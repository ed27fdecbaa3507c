use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use unghost_client::ClientConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default)]
    pub replay_base_url: Option<String>,
    pub timeout_secs: u64,
}

impl From<&BackendConfig> for ClientConfig {
    fn from(config: &BackendConfig) -> Self {
        let client = ClientConfig::new(config.base_url.clone()).with_timeout_secs(config.timeout_secs);
        match &config.replay_base_url {
            Some(url) => client.with_replay_base_url(url.clone()),
            None => client,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `unghost-agent.settings.json`
    pub settings_dir: PathBuf,
    /// Where exported reports and podcast audio are written
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub enable_background_investigation: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enable_background_investigation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (`UNGHOST_BACKEND__BASE_URL`, `UNGHOST_LOGGING__LEVEL`, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("UNGHOST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(File::from(path.as_ref()));

        builder.build()?.try_deserialize()
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Built-in defaults so the binary runs from any directory.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

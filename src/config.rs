use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub line: LineConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_storage_config")]
    pub storage: StorageConfig,
}

/// Credentials and endpoints for the LINE Messaging API.
#[derive(Debug, Deserialize, Clone)]
pub struct LineConfig {
    pub channel_secret: String,
    pub channel_access_token: String,
    #[serde(default = "default_reply_endpoint")]
    pub reply_endpoint: String,
    #[serde(default = "default_content_endpoint")]
    pub content_endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
    /// Where fetched media content is written.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_reply_endpoint() -> String {
    "https://api.line.me/v2/bot/message/reply".to_string()
}

fn default_content_endpoint() -> String {
    "https://api-data.line.me/v2/bot/message".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from("linebot.db")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_storage_config() -> StorageConfig {
    StorageConfig {
        database_path: default_db_path(),
        download_dir: default_download_dir(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if !config.storage.download_dir.exists() {
            std::fs::create_dir_all(&config.storage.download_dir).with_context(|| {
                format!(
                    "Failed to create download directory: {}",
                    config.storage.download_dir.display()
                )
            })?;
        }

        Ok(config)
    }

    /// True when both channel credentials are present. The server can run
    /// without them for local experiments, but signature checks and replies
    /// will fail against the real platform.
    pub fn has_credentials(&self) -> bool {
        !self.line.channel_secret.is_empty() && !self.line.channel_access_token.is_empty()
    }
}

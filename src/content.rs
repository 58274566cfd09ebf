use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::LineConfig;
use crate::dispatch::FetchHandler;
use crate::message::{HandleStatus, Message};
use crate::storage::MessageStore;

/// Fetch handler for media messages. Content retrieval is best-effort: a
/// failed download is a logged transport failure, and the message metadata
/// is archived either way so the record of the conversation stays complete.
pub struct ContentFetcher {
    client: reqwest::Client,
    config: LineConfig,
    download_dir: PathBuf,
    store: MessageStore,
}

impl ContentFetcher {
    pub fn new(config: LineConfig, download_dir: PathBuf, store: MessageStore) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            download_dir,
            store,
        }
    }

    /// Download the message content from the platform's data endpoint and
    /// write it under the download directory.
    async fn download(&self, message: &Message) -> Result<PathBuf> {
        let url = format!("{}/{}/content", self.config.content_endpoint, message.id);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.channel_access_token),
            )
            .send()
            .await
            .context("Failed to request message content")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("content endpoint error ({})", status);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read content body")?;

        let path = self
            .download_dir
            .join(target_filename(&message.id, message.filename()));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write content to {}", path.display()))?;

        info!("stored {} bytes of content at {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// On-disk name for fetched content: the message id, plus the declared file
/// name (sanitized) when one exists.
fn target_filename(message_id: &str, declared: Option<&str>) -> String {
    match declared.map(sanitize_filename) {
        Some(name) if !name.is_empty() => format!("{}_{}", message_id, name),
        _ => message_id.to_string(),
    }
}

// Keeps only the final path component and drops characters that could
// escape the download directory.
fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    base.chars()
        .filter(|c| !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

#[async_trait]
impl FetchHandler for ContentFetcher {
    async fn handle_fetch(&self, message: &Message) -> HandleStatus {
        let filepath = match self.download(message).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("content fetch failed for {}: {:#}", message.id, e);
                None
            }
        };

        self.store.archive(message, filepath.as_deref()).await
    }
}

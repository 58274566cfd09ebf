mod config;
mod content;
mod dispatch;
mod event;
mod message;
mod normalize;
mod reply;
mod report;
mod signature;
mod storage;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::content::ContentFetcher;
use crate::reply::LineReplyClient;
use crate::storage::MessageStore;
use crate::webhook::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,linebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Reply endpoint: {}", config.line.reply_endpoint);
    info!("  Database: {}", config.storage.database_path.display());
    info!("  Downloads: {}", config.storage.download_dir.display());

    if !config.has_credentials() {
        warn!("channel secret or access token is empty; inbound signatures and replies will fail");
    }

    // Open the message store
    let store = MessageStore::open(&config.storage.database_path)?;

    // Wire the collaborators behind their seams
    let fetcher = ContentFetcher::new(
        config.line.clone(),
        config.storage.download_dir.clone(),
        store.clone(),
    );
    let replies = LineReplyClient::new(config.line.clone());

    let state = AppState {
        line: config.line.clone(),
        records: Arc::new(store),
        files: Arc::new(fetcher),
        replies: Arc::new(replies),
    };

    info!("Bot is starting...");
    webhook::serve(state, &config.server.host, config.server.port).await?;

    Ok(())
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::LineConfig;

/// Outbound reply collaborator. The production implementation talks to the
/// platform's reply endpoint; tests substitute a recording stub.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, reply_token: &str, text: &str) -> Result<serde_json::Value>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<ReplyMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplyMessage<'a> {
    #[serde(rename = "type")]
    message_type: &'a str,
    text: &'a str,
}

/// Reply client for the LINE Messaging API.
pub struct LineReplyClient {
    client: reqwest::Client,
    config: LineConfig,
}

impl LineReplyClient {
    pub fn new(config: LineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ReplySender for LineReplyClient {
    async fn send_reply(&self, reply_token: &str, text: &str) -> Result<serde_json::Value> {
        let request = ReplyRequest {
            reply_token,
            messages: vec![ReplyMessage {
                message_type: "text",
                text,
            }],
        };

        debug!("replying via {}: {}", self.config.reply_endpoint, text);

        let response = self
            .client
            .post(&self.config.reply_endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.channel_access_token),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send reply request")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("reply endpoint error ({}): {}", status, error_body);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse reply response")?;

        debug!("reply endpoint answered: {}", body);
        Ok(body)
    }
}

use tracing::{info, warn};

use crate::message::{Message, ProcessOutcome};
use crate::reply::ReplySender;

/// Collects the outcome of a request and decides what the user-facing reply
/// will say. Nothing else in the pipeline composes reply text.
#[derive(Debug, Default)]
pub struct Reporter {
    // At most one pending reply per request lifecycle; a later error
    // overwrites an earlier one.
    pending: Option<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed handler outcome as the pending reply payload.
    pub fn report_error(&mut self, outcome: ProcessOutcome) {
        warn!("message handling failed: {}", outcome);
        self.pending = Some(outcome.to_string());
    }

    /// Record an upstream rejection (an invalid message) as the pending
    /// reply payload.
    pub fn report_invalid(&mut self, reason: &str) {
        warn!("rejected message: {}", reason);
        self.pending = Some(reason.to_string());
    }

    /// Log a successful outcome. Success never overwrites a pending error;
    /// the acknowledgment text is composed later from the message itself.
    pub fn report_success(&self, outcome: ProcessOutcome) {
        info!("message handled: {}", outcome);
    }

    pub fn pending_error(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// The reply the user will see for this request.
    pub fn reply_text(&self, message: &Message) -> String {
        match self.pending_error() {
            Some(description) => format!("we have a problem: {}", description),
            None => format!(
                "we have received and processed your {} message.",
                message.type_name()
            ),
        }
    }
}

/// Issue the acknowledgment reply for a completed request.
///
/// A message without a reply token cannot be answered (the platform would
/// reject the call), so the send is skipped with a log line. Transport
/// failures are logged and surfaced as `None`; there is no retry.
pub async fn send_acknowledgement(
    message: &Message,
    reporter: &Reporter,
    replies: &dyn ReplySender,
) -> Option<serde_json::Value> {
    if message.reply_token.is_empty() {
        info!("no reply token on message, skipping reply");
        return None;
    }

    let text = reporter.reply_text(message);
    match replies.send_reply(&message.reply_token, &text).await {
        Ok(response) => Some(response),
        Err(e) => {
            warn!("reply call failed: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    /// Records every (token, text) pair it is asked to send.
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSender {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplySender for RecordingSender {
        async fn send_reply(&self, reply_token: &str, text: &str) -> Result<serde_json::Value> {
            self.sent
                .lock()
                .unwrap()
                .push((reply_token.to_string(), text.to_string()));
            Ok(serde_json::json!({}))
        }
    }

    fn text_message() -> Message {
        Message {
            id: "m1".to_string(),
            reply_token: "tok-1".to_string(),
            timestamp: DateTime::<Utc>::default(),
            owner_id: "u1".to_string(),
            kind: MessageKind::Text {
                body: "hi".to_string(),
            },
        }
    }

    #[test]
    fn test_reply_text_success() {
        let reporter = Reporter::new();
        assert_eq!(
            reporter.reply_text(&text_message()),
            "we have received and processed your text message."
        );
    }

    #[test]
    fn test_reply_text_error_overrides_success() {
        let mut reporter = Reporter::new();
        reporter.report_error(ProcessOutcome::UserCreateError);
        assert_eq!(
            reporter.reply_text(&text_message()),
            "we have a problem: creating user failed"
        );
    }

    #[test]
    fn test_later_error_overwrites_pending() {
        let mut reporter = Reporter::new();
        reporter.report_invalid("no valid message type found");
        reporter.report_error(ProcessOutcome::DatabaseWriteError);
        assert_eq!(
            reporter.pending_error(),
            Some("writing in database failed")
        );
    }

    #[tokio::test]
    async fn test_acknowledgement_sends_once_with_token_and_text() {
        let sender = RecordingSender::new();
        let reporter = Reporter::new();

        let response = send_acknowledgement(&text_message(), &reporter, &sender).await;
        assert!(response.is_some());

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "tok-1");
        assert_eq!(sent[0].1, "we have received and processed your text message.");
    }

    #[tokio::test]
    async fn test_acknowledgement_skips_empty_token() {
        let sender = RecordingSender::new();
        let reporter = Reporter::new();

        let mut msg = text_message();
        msg.reply_token.clear();

        let response = send_acknowledgement(&msg, &reporter, &sender).await;
        assert!(response.is_none());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledgement_surfaces_transport_failure_as_none() {
        struct FailingSender;

        #[async_trait]
        impl ReplySender for FailingSender {
            async fn send_reply(&self, _t: &str, _x: &str) -> Result<serde_json::Value> {
                anyhow::bail!("connection reset")
            }
        }

        let reporter = Reporter::new();
        let response = send_acknowledgement(&text_message(), &reporter, &FailingSender).await;
        assert!(response.is_none());
    }
}

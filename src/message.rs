use chrono::{DateTime, Utc};

/// A normalized inbound message. Media kinds (image/audio/file) carry no
/// payload here; their content lives behind the LINE data endpoint, keyed
/// by `id`, and is fetched by the content handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Platform-assigned message ID. Empty only for `Invalid` messages.
    pub id: String,
    /// Single-use token for the synchronous reply. Empty means no reply is
    /// possible for this message.
    pub reply_token: String,
    /// Event time, truncated to whole seconds.
    pub timestamp: DateTime<Utc>,
    /// LINE user ID of the sender.
    pub owner_id: String,
    pub kind: MessageKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Text { body: String },
    Image,
    Audio,
    File { name: Option<String> },
    /// A message that failed extraction or normalization. It still flows
    /// through the pipeline so a diagnostic reply can be issued when a
    /// reply token exists.
    Invalid { reason: String },
}

impl Message {
    /// An invalid message carrying only a rejection reason and (possibly
    /// empty) reply token.
    pub fn invalid(reason: impl Into<String>, reply_token: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            reply_token: reply_token.into(),
            timestamp: DateTime::<Utc>::default(),
            owner_id: String::new(),
            kind: MessageKind::Invalid {
                reason: reason.into(),
            },
        }
    }

    /// Wire-level type name, as used in reply text and logs.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            MessageKind::Text { .. } => "text",
            MessageKind::Image => "image",
            MessageKind::Audio => "audio",
            MessageKind::File { .. } => "file",
            MessageKind::Invalid { .. } => "null",
        }
    }

    /// The rejection reason, if this message failed upstream processing.
    pub fn error_description(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Invalid { reason } => Some(reason),
            _ => None,
        }
    }

    /// Text body, applicable to text messages only.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Text { body } => Some(body),
            _ => None,
        }
    }

    /// Declared file name, applicable to file messages only.
    pub fn filename(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::File { name } => name.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            MessageKind::Invalid { reason } => write!(f, "invalid message: {}", reason),
            MessageKind::Text { body } => {
                write!(f, "text {} from {}: {}", self.id, self.owner_id, body)
            }
            MessageKind::File { name } => write!(
                f,
                "file {} from {}: {}",
                self.id,
                self.owner_id,
                name.as_deref().unwrap_or("(unnamed)")
            ),
            _ => write!(f, "{} {} from {}", self.type_name(), self.id, self.owner_id),
        }
    }
}

/// Closed set of handler results. Each variant has a fixed user-facing
/// description used verbatim in replies and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    AllOk,
    UserNotFound,
    UserCreateError,
    DatabaseWriteError,
    DatabaseReadError,
    DatabaseUpdateError,
    DatabaseDeleteError,
    DatabaseConnectionError,
}

impl ProcessOutcome {
    pub fn description(&self) -> &'static str {
        match self {
            ProcessOutcome::AllOk => "all is well",
            ProcessOutcome::UserNotFound => "no user found in the authorized database",
            ProcessOutcome::UserCreateError => "creating user failed",
            ProcessOutcome::DatabaseWriteError => "writing in database failed",
            ProcessOutcome::DatabaseReadError => "reading from database failed",
            ProcessOutcome::DatabaseUpdateError => "updating database failed",
            ProcessOutcome::DatabaseDeleteError => "deleting from database failed",
            ProcessOutcome::DatabaseConnectionError => "database connection failed",
        }
    }
}

impl std::fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Success flag plus named outcome, returned by every record/fetch handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleStatus {
    pub outcome: ProcessOutcome,
    pub success: bool,
}

impl HandleStatus {
    pub fn ok() -> Self {
        Self {
            outcome: ProcessOutcome::AllOk,
            success: true,
        }
    }

    pub fn failed(outcome: ProcessOutcome) -> Self {
        Self {
            outcome,
            success: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_descriptions() {
        assert_eq!(ProcessOutcome::AllOk.to_string(), "all is well");
        assert_eq!(
            ProcessOutcome::UserCreateError.to_string(),
            "creating user failed"
        );
        assert_eq!(
            ProcessOutcome::DatabaseWriteError.to_string(),
            "writing in database failed"
        );
        assert_eq!(
            ProcessOutcome::DatabaseConnectionError.to_string(),
            "database connection failed"
        );
    }

    #[test]
    fn test_handle_status_constructors() {
        let ok = HandleStatus::ok();
        assert!(ok.success);
        assert_eq!(ok.outcome, ProcessOutcome::AllOk);

        let failed = HandleStatus::failed(ProcessOutcome::DatabaseReadError);
        assert!(!failed.success);
        assert_eq!(failed.outcome, ProcessOutcome::DatabaseReadError);
    }

    #[test]
    fn test_invalid_message_carries_reason_and_token() {
        let msg = Message::invalid("no valid message type found", "tok-1");
        assert!(msg.id.is_empty());
        assert_eq!(msg.reply_token, "tok-1");
        assert_eq!(msg.error_description(), Some("no valid message type found"));
        assert_eq!(msg.type_name(), "null");
    }

    #[test]
    fn test_accessors_by_kind() {
        let text = Message {
            id: "m1".to_string(),
            reply_token: "t".to_string(),
            timestamp: DateTime::<Utc>::default(),
            owner_id: "u1".to_string(),
            kind: MessageKind::Text {
                body: "hi".to_string(),
            },
        };
        assert_eq!(text.text(), Some("hi"));
        assert_eq!(text.filename(), None);
        assert_eq!(text.error_description(), None);

        let file = Message {
            kind: MessageKind::File {
                name: Some("report.pdf".to_string()),
            },
            ..text.clone()
        };
        assert_eq!(file.text(), None);
        assert_eq!(file.filename(), Some("report.pdf"));
        assert_eq!(file.type_name(), "file");
    }
}

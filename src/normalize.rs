use tracing::warn;

use crate::event::ExtractedEvent;
use crate::message::{Message, MessageKind};

/// Turn an extracted event into a typed [`Message`].
///
/// Every failure path yields an `Invalid` message rather than an error:
/// the reply token is preserved so a diagnostic reply can still be issued,
/// and nothing here can take down the request.
pub fn normalize(event: ExtractedEvent) -> Message {
    let ExtractedEvent {
        reply_token,
        user_id,
        timestamp,
        message,
        ..
    } = event;

    // Invalid messages keep the event context (token, owner, time) so the
    // reporter and composer still have something to work with.
    let invalid = |reason: &str| Message {
        id: String::new(),
        reply_token: reply_token.clone(),
        timestamp,
        owner_id: user_id.clone(),
        kind: MessageKind::Invalid {
            reason: reason.to_string(),
        },
    };

    let raw = match message {
        Some(raw) => raw,
        None => return invalid("no valid message type found"),
    };

    let kind = match raw.message_type.as_deref() {
        Some(t) => match t.to_ascii_lowercase().as_str() {
            "text" => MessageKind::Text {
                body: raw.text.unwrap_or_default(),
            },
            "image" => MessageKind::Image,
            "audio" => MessageKind::Audio,
            "file" => MessageKind::File {
                name: raw.file_name,
            },
            other => {
                warn!("unrecognized message type {:?}", other);
                return invalid("no valid message type found");
            }
        },
        None => return invalid("no valid message type found"),
    };

    let id = match raw.id {
        Some(id) if !id.is_empty() => id,
        _ => {
            warn!("message carries no id, dropping to invalid");
            return invalid("message id missing");
        }
    };

    Message {
        id,
        reply_token,
        timestamp,
        owner_id: user_id,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{instant_from_millis, RawMessage};

    fn make_event(message: Option<RawMessage>) -> ExtractedEvent {
        ExtractedEvent {
            reply_token: "tok-1".to_string(),
            event_id: "ev-1".to_string(),
            user_id: "u1".to_string(),
            timestamp: instant_from_millis(1700000000000),
            message,
        }
    }

    #[test]
    fn test_normalize_text_round_trip() {
        let msg = normalize(make_event(Some(RawMessage {
            message_type: Some("text".to_string()),
            id: Some("m1".to_string()),
            text: Some("hi".to_string()),
            file_name: None,
        })));

        assert_eq!(msg.id, "m1");
        assert_eq!(msg.text(), Some("hi"));
        assert_eq!(msg.type_name(), "text");
        assert_eq!(msg.owner_id, "u1");
        assert_eq!(msg.reply_token, "tok-1");
        assert_eq!(msg.timestamp.timestamp(), 1700000000);
    }

    #[test]
    fn test_normalize_type_is_case_insensitive() {
        for spelling in ["TEXT", "Text", "tExT"] {
            let msg = normalize(make_event(Some(RawMessage {
                message_type: Some(spelling.to_string()),
                id: Some("m1".to_string()),
                text: Some("hi".to_string()),
                file_name: None,
            })));
            assert_eq!(msg.type_name(), "text", "spelling {:?}", spelling);
        }
    }

    #[test]
    fn test_normalize_file_keeps_name() {
        let msg = normalize(make_event(Some(RawMessage {
            message_type: Some("file".to_string()),
            id: Some("m2".to_string()),
            text: None,
            file_name: Some("notes.txt".to_string()),
        })));
        assert_eq!(msg.filename(), Some("notes.txt"));
        assert_eq!(msg.text(), None);
    }

    #[test]
    fn test_normalize_missing_type_yields_invalid() {
        let msg = normalize(make_event(Some(RawMessage {
            message_type: None,
            id: Some("m1".to_string()),
            text: None,
            file_name: None,
        })));
        assert!(msg.id.is_empty());
        assert_eq!(msg.error_description(), Some("no valid message type found"));
        // The token survives so a diagnostic reply can still go out.
        assert_eq!(msg.reply_token, "tok-1");
    }

    #[test]
    fn test_normalize_unrecognized_type_yields_invalid() {
        let msg = normalize(make_event(Some(RawMessage {
            message_type: Some("sticker".to_string()),
            id: Some("m1".to_string()),
            text: None,
            file_name: None,
        })));
        assert_eq!(msg.error_description(), Some("no valid message type found"));
    }

    #[test]
    fn test_normalize_missing_message_object_yields_invalid() {
        let msg = normalize(make_event(None));
        assert_eq!(msg.error_description(), Some("no valid message type found"));
    }

    #[test]
    fn test_normalize_missing_id_yields_invalid() {
        let msg = normalize(make_event(Some(RawMessage {
            message_type: Some("text".to_string()),
            id: None,
            text: Some("hi".to_string()),
            file_name: None,
        })));
        assert!(msg.id.is_empty());
        assert_eq!(msg.error_description(), Some("message id missing"));
    }
}

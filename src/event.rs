use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

/// Top-level webhook envelope. Everything below `events` is optional so a
/// partial or unexpected payload degrades into a rejection instead of a
/// deserialization error.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub events: Option<Vec<WebhookEvent>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookEvent {
    pub reply_token: Option<String>,
    pub webhook_event_id: Option<String>,
    pub delivery_context: Option<DeliveryContext>,
    pub source: Option<EventSource>,
    /// Event time in milliseconds since the Unix epoch.
    pub timestamp: Option<i64>,
    pub message: Option<RawMessage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryContext {
    pub is_redelivery: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSource {
    pub user_id: Option<String>,
}

/// The event's nested message object, untouched beyond field extraction.
/// Normalization into a typed [`crate::message::Message`] happens later.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMessage {
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub id: Option<String>,
    pub text: Option<String>,
    pub file_name: Option<String>,
}

/// Why an envelope was not turned into an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No `events` field, an empty list, or a body that does not parse as
    /// the envelope at all.
    NoEvents,
    /// The platform redelivered an event it already sent once. Dropped
    /// without a reply so redeliveries cannot cause duplicate effects.
    Redelivery,
    /// The event source carries no user ID, so the message cannot be
    /// attributed or persisted.
    NoUserId,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::NoEvents => "no valid message events",
            Rejection::Redelivery => "event is a redelivery",
            Rejection::NoUserId => "no user id found in event source",
        }
    }
}

/// A single webhook event reduced to the fields the pipeline needs.
#[derive(Debug)]
pub struct ExtractedEvent {
    pub reply_token: String,
    pub event_id: String,
    pub user_id: String,
    /// Converted from platform milliseconds to a whole-second instant.
    pub timestamp: DateTime<Utc>,
    pub message: Option<RawMessage>,
}

/// Parse the signature-verified raw body and pull out the first event.
///
/// The platform nominally batches events, but current deployments deliver
/// exactly one per callback, so only the first entry is handled. That is a
/// documented scope limitation, not an oversight.
pub fn extract(body: &[u8]) -> Result<ExtractedEvent, Rejection> {
    let envelope: WebhookEnvelope =
        serde_json::from_slice(body).map_err(|_| Rejection::NoEvents)?;

    let events = envelope.events.ok_or(Rejection::NoEvents)?;
    if events.len() > 1 {
        debug!("envelope holds {} events, handling the first only", events.len());
    }
    let event = events.into_iter().next().ok_or(Rejection::NoEvents)?;

    if event
        .delivery_context
        .as_ref()
        .is_some_and(|d| d.is_redelivery)
    {
        debug!(
            "dropping redelivered event {}",
            event.webhook_event_id.as_deref().unwrap_or("(unknown)")
        );
        return Err(Rejection::Redelivery);
    }

    let user_id = match event.source.and_then(|s| s.user_id) {
        Some(id) if !id.is_empty() => id,
        _ => {
            warn!("no user id found in event source, dropping event");
            return Err(Rejection::NoUserId);
        }
    };

    Ok(ExtractedEvent {
        reply_token: event.reply_token.unwrap_or_default(),
        event_id: event.webhook_event_id.unwrap_or_default(),
        user_id,
        timestamp: instant_from_millis(event.timestamp.unwrap_or_default()),
        message: event.message,
    })
}

/// Platform timestamps are in milliseconds; records keep second resolution.
pub fn instant_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(millis / 1000, 0).unwrap_or_default()
}

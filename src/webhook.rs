use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::LineConfig;
use crate::dispatch::{self, FetchHandler, RecordHandler};
use crate::event::{self, Rejection};
use crate::message::Message;
use crate::normalize;
use crate::reply::ReplySender;
use crate::report::{self, Reporter};
use crate::signature;

/// Everything a request needs, behind collaborator seams so tests can
/// substitute the persistence, fetch, and reply boundaries.
#[derive(Clone)]
pub struct AppState {
    pub line: LineConfig,
    pub records: Arc<dyn RecordHandler>,
    pub files: Arc<dyn FetchHandler>,
    pub replies: Arc<dyn ReplySender>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("webhook server listening on {}", addr);
    axum::serve(listener, router(state))
        .await
        .context("webhook server exited")?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

/// The inbound pipeline: signature check, event extraction, normalization,
/// dispatch, then the acknowledgment reply. The raw body bytes are verified
/// before any parsing and handed to the extractor untouched.
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let sig = headers
        .get("x-line-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !signature::verify(&state.line.channel_secret, sig, &body) {
        warn!("rejected webhook request: invalid signature");
        return StatusCode::BAD_REQUEST;
    }

    let message = match event::extract(&body) {
        Ok(extracted) => {
            debug!("handling webhook event {}", extracted.event_id);
            normalize::normalize(extracted)
        }
        // A redelivery must produce no side effects at all: no handler
        // call, no reply, just an acknowledging status.
        Err(Rejection::Redelivery) => return StatusCode::OK,
        // Other rejections flow on as invalid messages. They carry no
        // reply token, so the composer stops after logging.
        Err(rejection) => Message::invalid(rejection.reason(), ""),
    };

    run_pipeline(&state, &message).await;
    StatusCode::OK
}

async fn run_pipeline(state: &AppState, message: &Message) {
    info!("inbound {}", message);

    let mut reporter = Reporter::new();
    dispatch::dispatch(message, &*state.records, &*state.files, &mut reporter).await;
    report::send_acknowledgement(message, &reporter, &*state.replies).await;
}

use async_trait::async_trait;

use crate::message::{HandleStatus, Message, MessageKind};
use crate::report::Reporter;

/// Persistence collaborator for text messages.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle_record(&self, message: &Message) -> HandleStatus;
}

/// Collaborator for media messages whose content sits behind the platform's
/// data endpoint.
#[async_trait]
pub trait FetchHandler: Send + Sync {
    async fn handle_fetch(&self, message: &Message) -> HandleStatus;
}

/// Route a normalized message to the right handler and relay the outcome.
///
/// Messages that already failed upstream skip both handlers and go straight
/// to the reporter's error path. Handlers are never retried here; retry
/// policy, if any, belongs behind the collaborator boundary.
pub async fn dispatch(
    message: &Message,
    records: &dyn RecordHandler,
    files: &dyn FetchHandler,
    reporter: &mut Reporter,
) {
    if let Some(reason) = message.error_description() {
        reporter.report_invalid(reason);
        return;
    }

    let status = match &message.kind {
        MessageKind::Text { .. } => records.handle_record(message).await,
        _ => files.handle_fetch(message).await,
    };

    if status.success {
        reporter.report_success(status.outcome);
    } else {
        reporter.report_error(status.outcome);
    }
}

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::crypto::SIGNATURE_HEADER;
use crate::db::AppState;
use crate::error::{AppError, Result, msg};
use crate::processor::ProcessOutcome;
use crate::validation::WebhookPayload;

/// Body returned for every handled webhook (HTTP 200).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

impl WebhookResponse {
    fn new(status: &str, message: &str) -> Self {
        Self {
            status: status.to_string(),
            message: message.to_string(),
        }
    }
}

/// Both duplicate paths answer the same way: the sender only needs to know
/// the event is handled.
impl From<ProcessOutcome> for WebhookResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        match outcome {
            ProcessOutcome::Committed => Self::new("success", "Processed successfully"),
            ProcessOutcome::AlreadyProcessed(_) => Self::new("success", "Already processed"),
            ProcessOutcome::Contended => Self::new("ignored", "Concurrent request in progress"),
        }
    }
}

/// POST /webhook
///
/// Order matters: authenticate the raw bytes, then parse and validate, then
/// hand the typed event to the processor.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| {
            v.to_str()
                .map_err(|_| AppError::BadRequest(msg::MALFORMED_SIGNATURE_HEADER.into()))
        })
        .transpose()?;
    state.webhook_secret.verify(&body, signature)?;

    let event = WebhookPayload::from_slice(&body)?.validate()?;

    // Store calls block; keep them off the async workers
    let processor = state.processor.clone();
    let outcome = tokio::task::spawn_blocking(move || processor.process(&event))
        .await
        .map_err(|e| {
            tracing::error!("Processing task failed: {}", e);
            AppError::Internal(msg::CRITICAL_SECTION_PANICKED.into())
        })??;

    Ok(Json(WebhookResponse::from(outcome)))
}

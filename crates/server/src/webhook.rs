//! The inbound slash-command endpoint.
//!
//! The body is captured as raw bytes and verified byte-for-byte before any
//! form decoding happens; the signature is computed over exactly what was
//! received. Verification failures map to 401 without leaking the reason.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use tracing::{debug, warn};

use feedhorn_slack::commands::{CommandReply, CommandRouter};
use feedhorn_slack::form::SlashPayload;
use feedhorn_slack::verify::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

#[derive(Clone)]
pub struct WebhookState {
    verifier: Arc<SignatureVerifier>,
    commands: Arc<CommandRouter>,
}

pub fn router(verifier: Arc<SignatureVerifier>, commands: Arc<CommandRouter>) -> Router {
    Router::new()
        .route("/", post(handle_command))
        .with_state(WebhookState { verifier, commands })
}

async fn handle_command(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|value| value.to_str().ok());

    match state.verifier.verify(signature, timestamp, &body) {
        Ok(outcome) => {
            debug!(event_name = "webhook.request.verified", outcome = ?outcome, "request accepted");
        }
        Err(error) => {
            warn!(event_name = "webhook.request.rejected", error = %error, "request rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let payload = SlashPayload::from_form_bytes(&body);
    match state.commands.route(&payload).await {
        CommandReply::Text(text) => text.into_response(),
        CommandReply::Message(message) => Json(message).into_response(),
    }
}

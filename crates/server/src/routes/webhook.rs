//! Payment notification webhook handler.

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};
use tracing::instrument;

use crate::error::Result;
use crate::gateway::signature::SIGNATURE_HEADER;
use crate::state::AppState;

/// Handle a signed payment notification.
///
/// The body is taken as raw bytes so the signature is computed over exactly
/// what the sender signed, before any parsing. All outcomes except a bad
/// signature acknowledge with 200; failures after verification surface as
/// server errors so redeliveries stay observable.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn notify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state.checkout().handle_notification(&body, signature).await?;

    Ok(StatusCode::OK)
}

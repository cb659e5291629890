//! Checkout-session route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pampa_core::LineItem;

use crate::error::Result;
use crate::state::AppState;

/// Body of `POST /create-checkout-session`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub items: Vec<LineItem>,
    pub payer_email: String,
    pub shipping_address: String,
}

/// Response carrying the gateway preference identifier.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

/// Create a checkout preference and record a pending order for it.
#[instrument(skip(state, request), fields(lines = request.items.len()))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>> {
    let id = state
        .checkout()
        .create_checkout_session(
            request.items,
            &request.payer_email,
            &request.shipping_address,
        )
        .await?;

    Ok(Json(CreateSessionResponse { id }))
}

//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use pampa_core::LineItem;

use crate::error::Result;
use crate::models::{Order, OrderDetails};
use crate::state::AppState;

/// Body of `POST /create-order`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub payment_id: String,
    pub shipping_address: String,
    pub payer_email: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// Create a pending order.
#[instrument(skip(state, request), fields(payment_id = %request.payment_id))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state
        .checkout()
        .create_order(
            &request.payment_id,
            &request.shipping_address,
            &request.payer_email,
            request.items,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch the read projection of an order by payment id.
#[instrument(skip(state))]
pub async fn details(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<OrderDetails>> {
    let details = state.checkout().order_details(&payment_id).await?;
    Ok(Json(details))
}

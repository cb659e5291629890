//! Order model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use pampa_core::{Email, LineItem, OrderStatus, PaymentId};

/// A persisted order.
///
/// Keyed operationally by `payment_id`: the gateway preference identifier
/// the order was created for. Status starts `pending` and is set to `paid`
/// by the webhook handler once the gateway confirms an approved payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub payment_id: PaymentId,
    pub shipping_address: String,
    pub payer_email: Email,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create an order. The store assigns id, status, and
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub payment_id: PaymentId,
    pub shipping_address: String,
    pub payer_email: Email,
    pub items: Vec<LineItem>,
}

/// Read projection returned by the order-details endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: Uuid,
    pub shipping_address: String,
    pub status: OrderStatus,
}

impl From<&Order> for OrderDetails {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            shipping_address: order.shipping_address.clone(),
            status: order.status,
        }
    }
}

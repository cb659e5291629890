//! In-memory order store.
//!
//! Mirrors the Postgres store's semantics (unique payment id, idempotent
//! `mark_paid`) so the checkout service and router can be exercised in
//! tests without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use pampa_core::{OrderStatus, PaymentId};

use super::{OrderStore, StoreError};
use crate::models::{NewOrder, Order};

/// Order store backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<String, Order>>,
}

impl MemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut orders = self
            .orders
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let key = order.payment_id.to_string();
        if orders.contains_key(&key) {
            return Err(StoreError::Conflict(key));
        }

        let now = Utc::now();
        let stored = Order {
            id: Uuid::new_v4(),
            payment_id: order.payment_id,
            shipping_address: order.shipping_address,
            payer_email: order.payer_email,
            items: order.items,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        orders.insert(key, stored.clone());

        Ok(stored)
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<Order>, StoreError> {
        let orders = self
            .orders
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        Ok(orders.get(payment_id.as_str()).cloned())
    }

    async fn mark_paid(&self, payment_id: &PaymentId) -> Result<u64, StoreError> {
        let mut orders = self
            .orders
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match orders.get_mut(payment_id.as_str()) {
            Some(order) => {
                order.status = OrderStatus::Paid;
                order.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

//! `PostgreSQL` order store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use pampa_core::{Email, LineItem, OrderStatus, PaymentId};

use super::{OrderStore, StoreError};
use crate::models::{NewOrder, Order};

/// Order store backed by the `orders` table.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new Postgres-backed order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; converted to [`Order`] with validation.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    payment_id: String,
    shipping_address: String,
    payer_email: String,
    items: Json<Vec<LineItem>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_id = PaymentId::parse(&row.payment_id).map_err(|e| {
            StoreError::DataCorruption(format!("invalid payment id in database: {e}"))
        })?;
        let payer_email = Email::parse(&row.payer_email)
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;
        let status = OrderStatus::from_str(&row.status)
            .map_err(|e| StoreError::DataCorruption(format!("invalid status in database: {e}")))?;

        Ok(Self {
            id: row.id,
            payment_id,
            shipping_address: row.shipping_address,
            payer_email,
            items: row.items.0,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (payment_id, shipping_address, payer_email, items)
            VALUES ($1, $2, $3, $4)
            RETURNING id, payment_id, shipping_address, payer_email, items,
                      status, created_at, updated_at
            ",
        )
        .bind(order.payment_id.as_str())
        .bind(&order.shipping_address)
        .bind(order.payer_email.as_str())
        .bind(Json(&order.items))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(order.payment_id.to_string())
            }
            _ => StoreError::Database(e),
        })?;

        row.try_into()
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, payment_id, shipping_address, payer_email, items,
                   status, created_at, updated_at
            FROM orders
            WHERE payment_id = $1
            ",
        )
        .bind(payment_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn mark_paid(&self, payment_id: &PaymentId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = 'paid', updated_at = now()
            WHERE payment_id = $1
            ",
        )
        .bind(payment_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

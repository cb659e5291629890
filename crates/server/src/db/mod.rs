//! Order persistence.
//!
//! # Database: `pampa`
//!
//! A single `orders` table; the gateway is the source of truth for payment
//! state, this store only records orders and their `pending -> paid`
//! transition.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! sqlx migrate run --source crates/server/migrations
//! ```

pub mod memory;
pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use pampa_core::PaymentId;

use crate::models::{NewOrder, Order};

pub use memory::MemoryOrderStore;
pub use orders::PgOrderStore;

/// Errors from order store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An order already exists for this payment id.
    #[error("order already exists for payment {0}")]
    Conflict(String),

    /// A stored row could not be mapped back to the domain model.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Durable record of orders keyed by payment-preference identifier.
///
/// Implementations: [`PgOrderStore`] for production, [`MemoryOrderStore`]
/// for tests.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order with status `pending`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if an order already exists for the
    /// payment id, `StoreError::Database` for other failures.
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Look up an order by its payment id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    async fn find_by_payment_id(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<Order>, StoreError>;

    /// Set the order matching `payment_id` to `paid`.
    ///
    /// An unconditional set-by-key: applying it twice leaves the same state,
    /// and a missing order is not an error. Returns the number of rows
    /// matched (0 or 1 given the uniqueness constraint).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the update fails.
    async fn mark_paid(&self, payment_id: &PaymentId) -> Result<u64, StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

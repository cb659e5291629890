//! Payment gateway integration.
//!
//! Two outbound calls (`POST /checkout/preferences`, `GET /v1/payments/{id}`)
//! plus inbound webhook signature verification. The [`PaymentGateway`] trait
//! is the seam the checkout service is tested through.

pub mod client;
pub mod error;
pub mod signature;
pub mod types;

use async_trait::async_trait;

pub use client::GatewayClient;
pub use error::GatewayError;
pub use signature::{InvalidSignature, verify_signature};
pub use types::{InvalidAmount, PaymentStatus, PreferenceRequest};

/// Outbound payment gateway operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit a checkout preference and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails, the gateway responds
    /// with a non-success status, or the response carries no identifier.
    async fn create_preference(&self, request: &PreferenceRequest)
    -> Result<String, GatewayError>;

    /// Query the authoritative status of a payment.
    ///
    /// Used by the webhook handler instead of trusting the notification
    /// payload's contents.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the gateway responds
    /// with a non-success status.
    async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, GatewayError>;
}

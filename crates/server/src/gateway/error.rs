//! Gateway-related errors.

use thiserror::Error;

/// Errors that can occur when calling the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned a non-success response.
    #[error("gateway API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A success response was missing expected fields.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

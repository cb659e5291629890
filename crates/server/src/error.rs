//! Unified error handling with Sentry integration.
//!
//! Every handler failure is a checkout-lifecycle error; `AppError` wraps
//! [`CheckoutError`], owns its HTTP mapping, and captures server errors to
//! Sentry before responding. All route handlers return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::StoreError;
use crate::services::CheckoutError;

/// Application-level error type for the checkout server.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct AppError(#[from] CheckoutError);

impl AppError {
    const fn status(&self) -> StatusCode {
        match &self.0 {
            CheckoutError::Validation(_)
            | CheckoutError::InvalidSignature(_)
            | CheckoutError::Payload(_) => StatusCode::BAD_REQUEST,
            CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            // A bad cart total is a failure of the checkout attempt, not a
            // malformed request.
            CheckoutError::InvalidAmount(_) | CheckoutError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            CheckoutError::Gateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            match &self.0 {
                CheckoutError::Gateway(_) => "Payment gateway error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

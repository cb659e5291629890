//! HTTP route handlers for the checkout server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (database ping)
//!
//! POST /create-checkout-session      - Create a gateway preference + pending order
//! POST /create-order                 - Create a pending order directly
//! GET  /order-details/{payment_id}   - Order read projection
//! POST /webhook                      - Signed payment notification
//! ```

pub mod checkout;
pub mod orders;
pub mod webhook;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create all routes for the checkout server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/create-checkout-session", post(checkout::create_session))
        .route("/create-order", post(orders::create))
        .route("/order-details/{payment_id}", get(orders::details))
        .route("/webhook", post(webhook::notify))
}

/// Build the application router around a state.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK. Returns 503 Service
/// Unavailable if the database is not reachable. Passes trivially when no
/// pool is attached (test wiring).
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.pool() {
        Some(pool) => match sqlx::query("SELECT 1").fetch_one(pool).await {
            Ok(_) => StatusCode::OK,
            Err(_) => StatusCode::SERVICE_UNAVAILABLE,
        },
        None => StatusCode::OK,
    }
}

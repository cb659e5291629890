//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::{OrderStore, PgOrderStore};
use crate::gateway::{GatewayClient, GatewayError, PaymentGateway};
use crate::services::CheckoutService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Collaborators are trait objects so tests
/// can wire the router with an in-memory store and a fake gateway.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: Option<PgPool>,
    checkout: CheckoutService,
}

impl AppState {
    /// Create the production application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway HTTP client fails to build.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, GatewayError> {
        let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool.clone()));
        let gateway: Arc<dyn PaymentGateway> = Arc::new(GatewayClient::new(&config.gateway)?);
        Ok(Self::with_parts(config, Some(pool), store, gateway))
    }

    /// Assemble state from explicit collaborators.
    ///
    /// Used by `new` and by tests that substitute fakes. `pool` is only
    /// consulted by the readiness probe and may be `None` under test wiring.
    #[must_use]
    pub fn with_parts(
        config: ServerConfig,
        pool: Option<PgPool>,
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let checkout = CheckoutService::new(
            store,
            gateway,
            config.gateway.webhook_secret.clone(),
            config.base_url.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                checkout,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if one is attached.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}

//! Payment gateway REST client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use super::error::GatewayError;
use super::types::{PaymentResponse, PaymentStatus, PreferenceRequest, PreferenceResponse};
use super::PaymentGateway;
use crate::config::GatewayConfig;

/// Gateway API client for preference creation and payment lookup.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    api_base: String,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the access token
    /// is not a valid header value.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.access_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| GatewayError::InvalidResponse(format!("invalid access token: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for GatewayClient {
    #[instrument(skip(self, request))]
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/checkout/preferences", self.api_base);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let preference: PreferenceResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let id = preference
            .id
            .ok_or_else(|| GatewayError::InvalidResponse("missing preference id".to_string()))?;

        debug!(preference_id = %id, "Checkout preference created");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, GatewayError> {
        let url = format!("{}/v1/payments/{payment_id}", self.api_base);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        debug!(payment_status = ?payment.status, "Authoritative payment status fetched");
        Ok(payment.status)
    }
}

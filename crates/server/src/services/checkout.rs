//! Order lifecycle management.
//!
//! Owns the `pending -> paid` state machine: preference creation, order
//! persistence, and the webhook-driven status transition. Collaborators are
//! injected ([`OrderStore`], [`PaymentGateway`]) so the whole lifecycle can
//! be exercised with fakes.

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use pampa_core::{Email, LineItem, PaymentId};

use crate::db::{OrderStore, StoreError};
use crate::gateway::types::WebhookNotification;
use crate::gateway::{
    GatewayError, InvalidAmount, InvalidSignature, PaymentGateway, PaymentStatus,
    PreferenceRequest, verify_signature,
};
use crate::models::{NewOrder, Order, OrderDetails};

/// Errors from checkout and order-lifecycle operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required field is missing or malformed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Cart total is not a usable charge amount.
    #[error(transparent)]
    InvalidAmount(#[from] InvalidAmount),

    /// Webhook signature did not verify.
    #[error(transparent)]
    InvalidSignature(#[from] InvalidSignature),

    /// A correctly signed notification body could not be understood.
    #[error("malformed notification: {0}")]
    Payload(String),

    /// No order matches the payment id.
    #[error("no order found for payment {0}")]
    NotFound(String),

    /// Order store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payment gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Orchestrates preference creation, order persistence, and webhook-driven
/// status transitions.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    webhook_secret: SecretString,
    base_url: String,
}

impl CheckoutService {
    /// Create a new checkout service from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        webhook_secret: SecretString,
        base_url: String,
    ) -> Self {
        Self {
            store,
            gateway,
            webhook_secret,
            base_url,
        }
    }

    /// Create a checkout preference at the gateway and record a pending
    /// order for it.
    ///
    /// The order insert is best-effort: a failure there is logged and not
    /// surfaced, since the preference already exists and the hosted
    /// checkout can proceed.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad payer email, `InvalidAmount` for a
    /// non-positive or overflowing cart total (no outbound call is made),
    /// and `Gateway` when the preference request fails or the gateway
    /// returns an id no order can be keyed on.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn create_checkout_session(
        &self,
        items: Vec<LineItem>,
        payer_email: &str,
        shipping_address: &str,
    ) -> Result<String, CheckoutError> {
        let payer_email = Email::parse(payer_email)
            .map_err(|e| CheckoutError::Validation(format!("payer email: {e}")))?;
        if shipping_address.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "shipping address is required".to_string(),
            ));
        }

        let request =
            PreferenceRequest::from_cart(&items, &payer_email, shipping_address, &self.base_url)?;
        let preference_id = self.gateway.create_preference(&request).await?;
        info!(preference_id = %preference_id, "Checkout preference created");

        // An id we cannot key an order on leaves the payment untrackable,
        // so the session must fail rather than hand it to the client.
        let payment_id = PaymentId::parse(&preference_id).map_err(|e| {
            GatewayError::InvalidResponse(format!("unusable preference id: {e}"))
        })?;

        // Direct in-process follow-up; a store failure must not fail the
        // checkout, since the preference already exists.
        let order = NewOrder {
            payment_id,
            shipping_address: shipping_address.to_string(),
            payer_email,
            items,
        };
        if let Err(e) = self.store.insert(order).await {
            warn!(
                preference_id = %preference_id,
                error = %e,
                "Failed to record pending order for checkout session"
            );
        }

        Ok(preference_id)
    }

    /// Insert a new `pending` order.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a required field is missing or malformed,
    /// `Store(Conflict)` if an order already exists for the payment id.
    #[instrument(skip(self, items, payer_email, shipping_address))]
    pub async fn create_order(
        &self,
        payment_id: &str,
        shipping_address: &str,
        payer_email: &str,
        items: Vec<LineItem>,
    ) -> Result<Order, CheckoutError> {
        let payment_id = PaymentId::parse(payment_id)
            .map_err(|e| CheckoutError::Validation(format!("payment id: {e}")))?;
        if shipping_address.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "shipping address is required".to_string(),
            ));
        }
        let payer_email = Email::parse(payer_email)
            .map_err(|e| CheckoutError::Validation(format!("payer email: {e}")))?;

        let order = self
            .store
            .insert(NewOrder {
                payment_id,
                shipping_address: shipping_address.to_string(),
                payer_email,
                items,
            })
            .await?;

        info!(payment_id = %order.payment_id, "Order created");
        Ok(order)
    }

    /// Look up the read projection of an order by payment id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no order matches.
    #[instrument(skip(self))]
    pub async fn order_details(&self, payment_id: &str) -> Result<OrderDetails, CheckoutError> {
        let payment_id = PaymentId::parse(payment_id)
            .map_err(|e| CheckoutError::Validation(format!("payment id: {e}")))?;

        let order = self
            .store
            .find_by_payment_id(&payment_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(payment_id.to_string()))?;

        Ok(OrderDetails::from(&order))
    }

    /// Process a signed payment notification.
    ///
    /// The signature is verified over the raw body bytes before anything
    /// else happens. Non-"payment" notification types are acknowledged
    /// without further work. For payment events the authoritative status is
    /// fetched from the gateway; only `approved` transitions the matching
    /// order to `paid`, and a missing order is a no-op. The transition is an
    /// unconditional set-by-key, so redelivered notifications are
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignature` when the header is absent or does not
    /// match, `Payload` for an unintelligible signed body, and `Gateway` /
    /// `Store` for failures after verification.
    #[instrument(skip(self, body, signature))]
    pub async fn handle_notification(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), CheckoutError> {
        let signature = signature.ok_or(InvalidSignature)?;
        verify_signature(&self.webhook_secret, body, signature)?;

        let notification: WebhookNotification = serde_json::from_slice(body)
            .map_err(|e| CheckoutError::Payload(e.to_string()))?;

        if notification.kind.as_deref() != Some("payment") {
            debug!(kind = ?notification.kind, "Ignoring non-payment notification");
            return Ok(());
        }

        let payment_id = notification
            .data
            .and_then(|d| d.id)
            .ok_or_else(|| CheckoutError::Payload("payment notification without data.id".to_string()))?;

        let status = self.gateway.payment_status(&payment_id).await?;
        if status != PaymentStatus::Approved {
            debug!(payment_id = %payment_id, ?status, "Payment not approved; order unchanged");
            return Ok(());
        }

        let payment_id = PaymentId::parse(&payment_id)
            .map_err(|e| CheckoutError::Payload(format!("payment id: {e}")))?;
        let matched = self.store.mark_paid(&payment_id).await?;
        if matched == 0 {
            debug!(payment_id = %payment_id, "Approved payment with no matching order");
        } else {
            info!(payment_id = %payment_id, "Order marked paid");
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use pampa_core::OrderStatus;

    use super::*;
    use crate::db::MemoryOrderStore;
    use crate::gateway::GatewayError;

    const SECRET: &str = "test-webhook-secret";

    /// Gateway fake: scripted responses, call counting.
    struct FakeGateway {
        preference_id: String,
        status: PaymentStatus,
        preference_calls: AtomicUsize,
        status_calls: Mutex<Vec<String>>,
    }

    impl FakeGateway {
        fn new(preference_id: &str, status: PaymentStatus) -> Self {
            Self {
                preference_id: preference_id.to_string(),
                status,
                preference_calls: AtomicUsize::new(0),
                status_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_preference(
            &self,
            _request: &PreferenceRequest,
        ) -> Result<String, GatewayError> {
            self.preference_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.preference_id.clone())
        }

        async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, GatewayError> {
            self.status_calls
                .lock()
                .unwrap()
                .push(payment_id.to_string());
            Ok(self.status)
        }
    }

    fn service(gateway: Arc<FakeGateway>) -> (CheckoutService, Arc<MemoryOrderStore>) {
        let store = Arc::new(MemoryOrderStore::new());
        let svc = CheckoutService::new(
            store.clone(),
            gateway,
            SecretString::from(SECRET),
            "http://shop.test".to_string(),
        );
        (svc, store)
    }

    fn items(json: &str) -> Vec<LineItem> {
        serde_json::from_str(json).unwrap()
    }

    fn sign(body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn payment_notification(id: &str) -> Vec<u8> {
        format!(r#"{{"type":"payment","data":{{"id":"{id}"}}}}"#).into_bytes()
    }

    #[tokio::test]
    async fn test_checkout_session_creates_pending_order() {
        let gateway = Arc::new(FakeGateway::new("pref_1", PaymentStatus::Pending));
        let (svc, store) = service(gateway);

        let id = svc
            .create_checkout_session(
                items(r#"[{"title":"Shirt","quantity":2,"unit_price":10}]"#),
                "a@b.com",
                "123 Main St",
            )
            .await
            .unwrap();
        assert_eq!(id, "pref_1");

        let order = store
            .find_by_payment_id(&PaymentId::parse("pref_1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.shipping_address, "123 Main St");
    }

    #[tokio::test]
    async fn test_zero_total_makes_no_outbound_call() {
        let gateway = Arc::new(FakeGateway::new("pref_1", PaymentStatus::Pending));
        let (svc, _) = service(gateway.clone());

        let err = svc
            .create_checkout_session(
                items(r#"[{"title":"Free","quantity":1,"unit_price":0}]"#),
                "a@b.com",
                "addr",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidAmount(_)));
        assert_eq!(gateway.preference_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overflowing_total_is_rejected_without_outbound_call() {
        let gateway = Arc::new(FakeGateway::new("pref_1", PaymentStatus::Pending));
        let (svc, _) = service(gateway.clone());

        let err = svc
            .create_checkout_session(
                items(r#"[{"title":"Bundle","quantity":2,"unit_price":"70000000000000000000000000000"}]"#),
                "a@b.com",
                "addr",
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InvalidAmount(InvalidAmount::Overflow)
        ));
        assert_eq!(gateway.preference_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_long_preference_id_still_records_order() {
        let long_id = "p".repeat(200);
        let gateway = Arc::new(FakeGateway::new(&long_id, PaymentStatus::Pending));
        let (svc, store) = service(gateway);

        let id = svc
            .create_checkout_session(
                items(r#"[{"title":"A","quantity":1,"unit_price":5}]"#),
                "a@b.com",
                "addr",
            )
            .await
            .unwrap();
        assert_eq!(id, long_id);

        let order = store
            .find_by_payment_id(&PaymentId::parse(&long_id).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_unusable_preference_id_fails_session() {
        let gateway = Arc::new(FakeGateway::new("   ", PaymentStatus::Pending));
        let (svc, _) = service(gateway);

        let err = svc
            .create_checkout_session(
                items(r#"[{"title":"A","quantity":1,"unit_price":5}]"#),
                "a@b.com",
                "addr",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Gateway(GatewayError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_session_survives_insert_failure() {
        let gateway = Arc::new(FakeGateway::new("pref_dup", PaymentStatus::Pending));
        let (svc, store) = service(gateway);

        // Pre-existing order for the same preference id forces a conflict
        // on the follow-up insert.
        store
            .insert(NewOrder {
                payment_id: PaymentId::parse("pref_dup").unwrap(),
                shipping_address: "addr".to_string(),
                payer_email: Email::parse("a@b.com").unwrap(),
                items: Vec::new(),
            })
            .await
            .unwrap();

        let id = svc
            .create_checkout_session(
                items(r#"[{"title":"A","quantity":1,"unit_price":5}]"#),
                "a@b.com",
                "addr",
            )
            .await
            .unwrap();
        assert_eq!(id, "pref_dup");
    }

    #[tokio::test]
    async fn test_create_order_validation() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Pending));
        let (svc, _) = service(gateway);

        let err = svc
            .create_order("", "addr", "a@b.com", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));

        let err = svc
            .create_order("pay_1", "  ", "a@b.com", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));

        let err = svc
            .create_order("pay_1", "addr", "not-an-email", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_order_duplicate_conflicts() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Pending));
        let (svc, _) = service(gateway);

        svc.create_order("pay_1", "addr", "a@b.com", Vec::new())
            .await
            .unwrap();
        let err = svc
            .create_order("pay_1", "addr", "a@b.com", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_order_details_not_found() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Pending));
        let (svc, _) = service(gateway);

        let err = svc.order_details("pay_missing").await.unwrap_err();
        assert!(matches!(err, CheckoutError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_approved_notification_marks_order_paid() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Approved));
        let (svc, _) = service(gateway);

        svc.create_order(
            "pay_123",
            "123 Main St",
            "a@b.com",
            items(r#"[{"title":"Shirt","quantity":2,"unit_price":10}]"#),
        )
        .await
        .unwrap();

        let body = payment_notification("pay_123");
        svc.handle_notification(&body, Some(&sign(&body)))
            .await
            .unwrap();

        let details = svc.order_details("pay_123").await.unwrap();
        assert_eq!(details.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_redelivered_notification_is_idempotent() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Approved));
        let (svc, _) = service(gateway);

        svc.create_order("pay_123", "addr", "a@b.com", Vec::new())
            .await
            .unwrap();

        let body = payment_notification("pay_123");
        let sig = sign(&body);
        svc.handle_notification(&body, Some(&sig)).await.unwrap();
        svc.handle_notification(&body, Some(&sig)).await.unwrap();

        let details = svc.order_details("pay_123").await.unwrap();
        assert_eq!(details.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_bad_signature_rejected_and_order_untouched() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Approved));
        let (svc, _) = service(gateway);

        svc.create_order("pay_123", "addr", "a@b.com", Vec::new())
            .await
            .unwrap();

        let body = payment_notification("pay_123");
        let err = svc
            .handle_notification(&body, Some("deadbeef"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidSignature(_)));

        let err = svc.handle_notification(&body, None).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidSignature(_)));

        let details = svc.order_details("pay_123").await.unwrap();
        assert_eq!(details.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_non_payment_type_acknowledged_without_calls() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Approved));
        let (svc, _) = service(gateway.clone());

        let body = br#"{"type":"plan","data":{"id":"42"}}"#;
        svc.handle_notification(body, Some(&sign(body)))
            .await
            .unwrap();

        assert!(gateway.status_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unapproved_status_leaves_order_pending() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Rejected));
        let (svc, _) = service(gateway);

        svc.create_order("pay_123", "addr", "a@b.com", Vec::new())
            .await
            .unwrap();

        let body = payment_notification("pay_123");
        svc.handle_notification(&body, Some(&sign(&body)))
            .await
            .unwrap();

        let details = svc.order_details("pay_123").await.unwrap();
        assert_eq!(details.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_approved_payment_without_matching_order_is_noop() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Approved));
        let (svc, _) = service(gateway);

        let body = payment_notification("pay_unknown");
        svc.handle_notification(&body, Some(&sign(&body)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_signed_garbage_is_payload_error() {
        let gateway = Arc::new(FakeGateway::new("p", PaymentStatus::Approved));
        let (svc, _) = service(gateway);

        let body = b"not json at all";
        let err = svc
            .handle_notification(body, Some(&sign(body)))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Payload(_)));
    }
}

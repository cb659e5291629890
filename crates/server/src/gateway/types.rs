//! Gateway wire types.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use pampa_core::{Email, LineItem, cart_total};

/// Currency attached to every preference item.
pub const CURRENCY_ID: &str = "ARS";

/// Title used when a cart line arrives without one.
pub const DEFAULT_ITEM_TITLE: &str = "Product";

/// Cart rejected because its total is not a usable charge amount.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum InvalidAmount {
    #[error("cart total must be greater than zero (got {0})")]
    NonPositive(Decimal),
    #[error("cart total exceeds the representable amount range")]
    Overflow,
}

/// Body of `POST /checkout/preferences`.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub back_urls: BackUrls,
    pub auto_return: String,
    /// Opaque carrier for the shipping address.
    pub additional_info: String,
}

/// One normalized line of a preference.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub currency_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Payer block of a preference.
#[derive(Debug, Clone, Serialize)]
pub struct PreferencePayer {
    pub email: String,
}

/// Redirect targets for the hosted checkout page.
#[derive(Debug, Clone, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

impl PreferenceRequest {
    /// Build a preference from a cart.
    ///
    /// Normalizes each line (missing or empty titles default to
    /// [`DEFAULT_ITEM_TITLE`]), fixes the currency to [`CURRENCY_ID`], and
    /// attaches redirect URLs derived from `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAmount`] unless the cart total is strictly positive
    /// and representable.
    pub fn from_cart(
        items: &[LineItem],
        payer_email: &Email,
        shipping_address: &str,
        base_url: &str,
    ) -> Result<Self, InvalidAmount> {
        let total = cart_total(items).ok_or(InvalidAmount::Overflow)?;
        if total <= Decimal::ZERO {
            return Err(InvalidAmount::NonPositive(total));
        }

        let items = items
            .iter()
            .map(|item| PreferenceItem {
                title: item
                    .title
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or(DEFAULT_ITEM_TITLE)
                    .to_string(),
                quantity: item.quantity,
                currency_id: CURRENCY_ID.to_string(),
                unit_price: item.unit_price,
            })
            .collect();

        let base = base_url.trim_end_matches('/');

        Ok(Self {
            items,
            payer: PreferencePayer {
                email: payer_email.to_string(),
            },
            back_urls: BackUrls {
                success: format!("{base}/checkout/success"),
                failure: format!("{base}/checkout/failure"),
                pending: format!("{base}/checkout/pending"),
            },
            auto_return: "approved".to_string(),
            additional_info: shipping_address.to_string(),
        })
    }
}

/// Response of `POST /checkout/preferences`.
#[derive(Debug, Deserialize)]
pub struct PreferenceResponse {
    pub id: Option<String>,
}

/// Authoritative payment status from `GET /v1/payments/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
    #[serde(other)]
    Unknown,
}

/// Response of `GET /v1/payments/{id}`.
#[derive(Debug, Deserialize)]
pub struct PaymentResponse {
    pub status: PaymentStatus,
}

/// An inbound webhook notification, parsed after signature verification.
#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    /// Declared event type; only `"payment"` is processed.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Option<NotificationData>,
}

/// Payload of a notification.
#[derive(Debug, Deserialize)]
pub struct NotificationData {
    /// Gateway-assigned payment identifier; delivered as a string or a
    /// number depending on the event source.
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: Option<String>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn items(json: &str) -> Vec<LineItem> {
        serde_json::from_str(json).unwrap()
    }

    fn email() -> Email {
        Email::parse("a@b.com").unwrap()
    }

    #[test]
    fn test_from_cart_rejects_zero_total() {
        let cart = items(r#"[{"title":"Free","quantity":3,"unit_price":0}]"#);
        let err = PreferenceRequest::from_cart(&cart, &email(), "addr", "http://x").unwrap_err();
        assert_eq!(err, InvalidAmount::NonPositive(Decimal::ZERO));
    }

    #[test]
    fn test_from_cart_rejects_overflowing_total() {
        let cart = items(
            r#"[{"title":"Bundle","quantity":2,"unit_price":"70000000000000000000000000000"}]"#,
        );
        let err = PreferenceRequest::from_cart(&cart, &email(), "addr", "http://x").unwrap_err();
        assert_eq!(err, InvalidAmount::Overflow);
    }

    #[test]
    fn test_from_cart_rejects_negative_total() {
        let cart = items(r#"[{"title":"Refund","quantity":1,"unit_price":"-5"}]"#);
        assert!(PreferenceRequest::from_cart(&cart, &email(), "addr", "http://x").is_err());
    }

    #[test]
    fn test_from_cart_rejects_empty_cart() {
        assert!(PreferenceRequest::from_cart(&[], &email(), "addr", "http://x").is_err());
    }

    #[test]
    fn test_from_cart_fixes_currency_and_coerces_string_price() {
        let cart = items(r#"[{"title":"Shirt","quantity":2,"unit_price":"10"}]"#);
        let req =
            PreferenceRequest::from_cart(&cart, &email(), "123 Main St", "http://shop").unwrap();

        let item = req.items.first().unwrap();
        assert_eq!(item.currency_id, CURRENCY_ID);
        assert_eq!(item.unit_price, Decimal::from(10));
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_from_cart_defaults_missing_title() {
        let cart = items(r#"[{"quantity":1,"unit_price":5},{"title":"  ","quantity":1,"unit_price":5}]"#);
        let req = PreferenceRequest::from_cart(&cart, &email(), "addr", "http://x").unwrap();

        assert!(req.items.iter().all(|i| i.title == DEFAULT_ITEM_TITLE));
    }

    #[test]
    fn test_from_cart_back_urls_and_additional_info() {
        let cart = items(r#"[{"title":"A","quantity":1,"unit_price":1}]"#);
        let req =
            PreferenceRequest::from_cart(&cart, &email(), "123 Main St", "http://shop/").unwrap();

        assert_eq!(req.back_urls.success, "http://shop/checkout/success");
        assert_eq!(req.back_urls.failure, "http://shop/checkout/failure");
        assert_eq!(req.back_urls.pending, "http://shop/checkout/pending");
        assert_eq!(req.auto_return, "approved");
        assert_eq!(req.additional_info, "123 Main St");
    }

    #[test]
    fn test_notification_id_accepts_number_and_string() {
        let n: WebhookNotification =
            serde_json::from_str(r#"{"type":"payment","data":{"id":123}}"#).unwrap();
        assert_eq!(n.data.unwrap().id.as_deref(), Some("123"));

        let n: WebhookNotification =
            serde_json::from_str(r#"{"type":"payment","data":{"id":"abc"}}"#).unwrap();
        assert_eq!(n.data.unwrap().id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_payment_status_unknown_fallback() {
        let r: PaymentResponse = serde_json::from_str(r#"{"status":"charged_back"}"#).unwrap();
        assert_eq!(r.status, PaymentStatus::Unknown);
    }
}

//! Cart line item.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de};

/// A single line of a cart: what is being bought, how many, and at what
/// unit price.
///
/// `unit_price` accepts either a JSON number or a numeric string on input;
/// clients of the original checkout form submit both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display title. Optional on input; normalized downstream.
    #[serde(default)]
    pub title: Option<String>,
    /// Units purchased.
    pub quantity: u32,
    /// Price per unit in the store currency.
    #[serde(
        alias = "unitPrice",
        deserialize_with = "decimal_from_number_or_string"
    )]
    pub unit_price: Decimal,
}

impl LineItem {
    /// Line total: `unit_price * quantity`.
    ///
    /// Returns `None` when the product overflows the `Decimal` range;
    /// unit prices arrive from untrusted request bodies.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of line totals over a cart, or `None` if any step overflows.
#[must_use]
pub fn cart_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.total()?))
}

/// Deserialize a [`Decimal`] from either a JSON number or a numeric string.
fn decimal_from_number_or_string<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Decimal::try_from(n).map_err(de::Error::custom),
        NumberOrString::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| de::Error::custom(format!("invalid unit price {s:?}: {e}"))),
    }
}

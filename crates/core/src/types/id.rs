//! Payment-preference identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PaymentId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PaymentIdError {
    /// The input string is empty or whitespace only.
    #[error("payment id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("payment id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The gateway-assigned payment-preference identifier.
///
/// Opaque to this system: the gateway returns it when a checkout preference
/// is created, and it is the natural key for order lookup and for matching
/// webhook notifications back to an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Maximum length accepted for a payment identifier.
    ///
    /// Generous on purpose: the identifier is assigned by the gateway, so
    /// the cap only guards against absurd inputs, never against real ids.
    pub const MAX_LENGTH: usize = 512;

    /// Parse a `PaymentId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty (after trimming) or longer
    /// than [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, PaymentIdError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(PaymentIdError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(PaymentIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PaymentId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PaymentId {
    type Err = PaymentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PaymentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

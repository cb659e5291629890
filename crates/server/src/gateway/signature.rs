//! Webhook signature verification.
//!
//! The gateway signs each notification with HMAC-SHA256 over the exact body
//! bytes under a pre-shared secret and sends the hex digest in a request
//! header. Verification must run over the raw bytes as received - never a
//! re-serialized copy - and before any order mutation is attempted.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

/// Header carrying the hex HMAC digest of the notification body.
pub const SIGNATURE_HEADER: &str = "x-mercadopago-signature";

/// The supplied signature did not match the body.
#[derive(Debug, Error)]
#[error("invalid webhook signature")]
pub struct InvalidSignature;

/// Verify a webhook signature against the raw body bytes.
///
/// Pure function with no side effects. Only the exact hex-encoded
/// HMAC-SHA256 digest of `body` under `secret` is accepted.
///
/// # Errors
///
/// Returns [`InvalidSignature`] on any mismatch.
pub fn verify_signature(
    secret: &SecretString,
    body: &[u8],
    signature: &str,
) -> Result<(), InvalidSignature> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| InvalidSignature)?;
    mac.update(body);

    let expected = hex::encode(mac.finalize().into_bytes());

    if constant_time_compare(&expected, signature) {
        Ok(())
    } else {
        Err(InvalidSignature)
    }
}

/// Compare two strings without early exit on the first differing byte.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

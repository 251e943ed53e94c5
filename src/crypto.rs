//! Webhook payload authentication.
//!
//! The sender signs the exact request body with HMAC-SHA256 and sends the
//! lowercase hex digest in the `X-Signature` header. Verification must run on
//! the raw bytes, before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result, msg};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";

/// Shared secret used to authenticate webhook bodies.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    /// Hex-encoded HMAC-SHA256 of `body`.
    pub fn sign(&self, body: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.0)
            .map_err(|_| AppError::Internal(msg::INVALID_WEBHOOK_SECRET.into()))?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a provided signature against the body.
    ///
    /// `None` means the header was absent. Returns `MissingSignature` or
    /// `InvalidSignature` on failure so the caller can answer 401 directly.
    pub fn verify(&self, body: &[u8], provided: Option<&str>) -> Result<()> {
        let Some(provided) = provided else {
            tracing::warn!("Webhook rejected: missing signature header");
            return Err(AppError::MissingSignature);
        };

        let expected = self.sign(body)?;
        let expected_bytes = expected.as_bytes();
        let provided_bytes = provided.as_bytes();

        // Length is not secret: a SHA-256 hex digest is always 64 chars
        if expected_bytes.len() != provided_bytes.len() {
            tracing::warn!("Webhook rejected: invalid signature");
            return Err(AppError::InvalidSignature);
        }

        if bool::from(expected_bytes.ct_eq(provided_bytes)) {
            Ok(())
        } else {
            tracing::warn!("Webhook rejected: invalid signature");
            Err(AppError::InvalidSignature)
        }
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret([REDACTED])")
    }
}

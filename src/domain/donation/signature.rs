//! Stripe webhook signature verification.
//!
//! Stripe signs each delivery with HMAC-SHA256 over `"{timestamp}.{body}"`
//! and sends the result in the `Stripe-Signature` header as
//! `t=<unix ts>,v1=<hex digest>`. Verification operates on the raw request
//! bytes; the payload is never re-serialized before signing.

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Deliveries older than this are rejected as replays.
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Allowed clock skew for timestamps in the future.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parse a `t=...,v1=...` header. Unknown schemes are ignored; the
    /// first `v1` entry wins.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let mut kv = part.trim().splitn(2, '=');
            let key = kv.next().unwrap_or_default();
            let value = kv.next().unwrap_or_default();

            match key {
                "t" if timestamp.is_none() => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| WebhookError::InvalidSignatureHeader)?,
                    );
                }
                "v1" if signature.is_none() => {
                    signature = Some(hex_decode(value)?);
                }
                _ => {}
            }
        }

        match (timestamp, signature) {
            (Some(timestamp), Some(signature)) => Ok(Self {
                timestamp,
                signature,
            }),
            _ => Err(WebhookError::InvalidSignatureHeader),
        }
    }
}

// Decodes over bytes, not char boundaries; arbitrary UTF-8 in the header
// must come back as an error, never a panic.
fn hex_decode(hex: &str) -> Result<Vec<u8>, WebhookError> {
    let bytes = hex.as_bytes();
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return Err(WebhookError::InvalidSignatureHeader);
    }
    bytes
        .chunks_exact(2)
        .map(|pair| Ok(hex_nibble(pair[0])? << 4 | hex_nibble(pair[1])?))
        .collect()
}

fn hex_nibble(b: u8) -> Result<u8, WebhookError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(WebhookError::InvalidSignatureHeader),
    }
}

/// Verifies webhook deliveries against the configured signing secret.
///
/// The secret is optional so the service can boot without payment
/// credentials; verification of any delivery then fails with
/// [`WebhookError::MissingSecret`].
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: Option<SecretString>,
}

impl StripeWebhookVerifier {
    pub fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Verify the signature over the raw payload, then parse the event.
    ///
    /// The JSON is only parsed after the signature checks out, so an
    /// attacker cannot probe the parser with unsigned payloads.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        let secret = self
            .secret
            .as_ref()
            .ok_or(WebhookError::MissingSecret)?;

        let header = SignatureHeader::parse(signature_header)?;
        validate_timestamp(header.timestamp, Utc::now().timestamp())?;

        let expected = compute_signature(secret.expose_secret(), header.timestamp, payload);
        if expected.ct_eq(header.signature.as_slice()).unwrap_u8() != 1 {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    if now - timestamp > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if timestamp - now > MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    Ok(())
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(signed_payload.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Produce a valid `Stripe-Signature` header for a payload. Intended for
/// tests and local tooling; the service itself only verifies.
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = compute_signature(secret, timestamp, payload);
    let hex: String = signature.iter().map(|b| format!("{:02x}", b)).collect();
    format!("t={},v1={}", timestamp, hex)
}

//! Error taxonomy for webhook ingestion.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur while ingesting a webhook delivery.
///
/// Everything up to and including signature verification is the caller's
/// problem and maps to 400; once a delivery is authenticated, only a
/// persistence failure may produce a non-200 so Stripe retries it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Request body is empty")]
    MissingBody,

    #[error("Missing Stripe-Signature header")]
    MissingSignatureHeader,

    #[error("Webhook signing secret is not configured")]
    MissingSecret,

    #[error("Invalid Stripe-Signature header format")]
    InvalidSignatureHeader,

    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Webhook timestamp is outside the accepted window")]
    TimestampOutOfRange,

    /// Malformed payload. Terminal 400 rather than 500: the payload is
    /// exactly the bytes that were signed, so redelivering it can never
    /// parse any better.
    #[error("Failed to parse webhook payload: {0}")]
    ParseError(String),

    #[error("Failed to record donation: {0}")]
    Database(String),
}

impl WebhookError {
    /// Whether Stripe should retry the delivery.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// HTTP status for the webhook response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingBody
            | Self::MissingSignatureHeader
            | Self::MissingSecret
            | Self::InvalidSignatureHeader
            | Self::InvalidSignature
            | Self::TimestampOutOfRange
            | Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

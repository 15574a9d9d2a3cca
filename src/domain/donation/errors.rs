//! Errors for the payment-origination operations.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DonationError {
    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed {
        field: &'static str,
        reason: String,
    },

    #[error("Payment intent creation failed: {0}")]
    IntentCreationFailed(String),

    #[error("Subscription payment could not be initialized: {0}")]
    SubscriptionPaymentUnavailable(String),

    #[error("Payment provider error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DonationError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field,
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::IntentCreationFailed(_)
            | Self::SubscriptionPaymentUnavailable(_)
            | Self::Gateway(_)
            | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
